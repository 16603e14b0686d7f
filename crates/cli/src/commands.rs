//! Sub-command execution. Every command prints one JSON document to stdout.

use std::io::Write;

use anyhow::Context;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use device_server::{HttpSession, SessionConfig};
use directory::{
    power_control_object_type, Client, ClientName, DeviceDirectoryClient, DeviceServerSession,
    Instance, ObjectType, ObjectTypeId, PowerState,
};
use serde_json::{json, Value};
use tracing::info;

use crate::cli::{Command, PayloadArgs};

/// Connects to the device server and runs `command` against it.
pub async fn run(command: Command, config: &SessionConfig) -> anyhow::Result<()> {
    let session = HttpSession::connect(config)
        .await
        .context("connecting to the device server")?;
    let directory = DeviceDirectoryClient::new(session);

    let output = execute(&directory, command).await?;

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &output)?;
    writeln!(stdout)?;
    Ok(())
}

/// Runs `command` and returns the document to print.
pub async fn execute<S>(
    directory: &DeviceDirectoryClient<S>,
    command: Command,
) -> anyhow::Result<Value>
where
    S: DeviceServerSession,
{
    match command {
        Command::Clients => {
            let clients = directory.list_clients().await?;
            Ok(Value::Array(clients.iter().map(client_view).collect()))
        }
        Command::ObjectTypes { client } => {
            let client = directory.find_client(&client).await?;
            let object_types = directory.list_object_types(&client).await?;
            Ok(Value::Array(object_types.iter().map(object_type_view).collect()))
        }
        Command::Instances {
            client,
            object_type,
        } => {
            let object_type = locate(directory, &client, &object_type).await?;
            let instances = directory.list_instances(&object_type).await?;
            Ok(Value::Array(instances.iter().map(instance_view).collect()))
        }
        Command::Write {
            client,
            object_type,
            instance,
            payload,
        } => {
            let data = read_payload(payload).await?;
            let object_type = locate(directory, &client, &object_type).await?;
            directory
                .write_instance_data(data.as_deref(), &object_type, instance)
                .await?;

            info!(%client, object_type = %object_type.id(), %instance, "instance written");
            Ok(json!({
                "client": client.as_str(),
                "object_type": object_type.id().as_str(),
                "instance": instance.as_u64(),
                "written": true,
            }))
        }
        Command::Power {
            client,
            instance,
            state,
        } => {
            let state = PowerState::from(state);
            let object_type = locate(directory, &client, &power_control_object_type()).await?;
            let data = state.to_instance_data();
            directory
                .write_instance_data(Some(data.as_bytes()), &object_type, instance)
                .await?;

            info!(%client, %instance, on = state.on, "power state written");
            Ok(json!({
                "client": client.as_str(),
                "instance": instance.as_u64(),
                "on": state.on,
            }))
        }
    }
}

async fn locate<S>(
    directory: &DeviceDirectoryClient<S>,
    client: &ClientName,
    object_type: &ObjectTypeId,
) -> anyhow::Result<ObjectType>
where
    S: DeviceServerSession,
{
    let client = directory.find_client(client).await?;
    Ok(directory.find_object_type(&client, object_type).await?)
}

async fn read_payload(args: PayloadArgs) -> anyhow::Result<Option<Vec<u8>>> {
    match (args.data, args.file) {
        (Some(data), _) => Ok(Some(data.into_bytes())),
        (None, Some(path)) => {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("reading payload file {}", path.display()))?;
            Ok(Some(bytes))
        }
        (None, None) => Ok(None),
    }
}

fn client_view(client: &Client) -> Value {
    json!({ "name": client.name().as_str() })
}

fn object_type_view(object_type: &ObjectType) -> Value {
    json!({ "id": object_type.id().as_str() })
}

/// JSON payloads are embedded under `data`; anything else is base64 under
/// `base64`.
fn instance_view(instance: &Instance) -> Value {
    let id = instance.id().as_u64();
    match instance.data().to_json() {
        Ok(data) => json!({ "id": id, "data": data }),
        Err(_) => json!({ "id": id, "base64": BASE64.encode(instance.data().as_bytes()) }),
    }
}
