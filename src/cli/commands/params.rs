use clap::Subcommand;
use serde_json::{json, Map, Value};

use crate::cli::client::ApiClient;
use crate::cli::utils::{output_empty_collection, output_success, output_value};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum ParamsCommands {
    #[command(about = "List flags, optionally under one prefix")]
    List {
        #[arg(long, help = "Only flags under this prefix")]
        prefix: Option<String>,
    },

    #[command(about = "List the distinct prefixes in use")]
    Prefixes,

    #[command(about = "Show one flag")]
    Get {
        #[arg(help = "Flag id")]
        id: String,
        #[arg(long, help = "Flag prefix")]
        prefix: Option<String>,
    },

    #[command(about = "Create a flag")]
    Create {
        #[arg(help = "Flag id")]
        id: String,
        #[arg(help = "Flag value")]
        value: String,
        #[arg(long = "type", default_value = "STRING", help = "Value type (BOOLEAN, STRING, INTEGER, DOUBLE, DATE, TIME, DATETIME, JSON)")]
        value_type: String,
        #[arg(long, help = "Description")]
        description: Option<String>,
        #[arg(long, help = "Flag prefix")]
        prefix: Option<String>,
        #[arg(long, help = "Store type (String, StringList, SecureString)")]
        store_type: Option<String>,
        #[arg(long, help = "Recorded modifier (defaults to the caller)")]
        modified_by: Option<String>,
    },

    #[command(about = "Update fields of a flag")]
    Update {
        #[arg(help = "Flag id")]
        id: String,
        #[arg(long, help = "Flag prefix")]
        prefix: Option<String>,
        #[arg(long, help = "New value")]
        value: Option<String>,
        #[arg(long, help = "New description")]
        description: Option<String>,
        #[arg(long, conflicts_with = "description", help = "Clear the description")]
        clear_description: bool,
        #[arg(long = "type", help = "New value type")]
        value_type: Option<String>,
        #[arg(long, help = "Recorded modifier (defaults to the caller)")]
        modified_by: Option<String>,
    },

    #[command(about = "Delete a flag by id")]
    Delete {
        #[arg(help = "Flag id")]
        id: String,
        #[arg(long, help = "Flag prefix")]
        prefix: Option<String>,
    },

    #[command(about = "Delete a flag by its parameter ARN")]
    DeleteRef {
        #[arg(help = "Parameter ARN")]
        arn: String,
    },
}

pub async fn handle(cmd: ParamsCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ParamsCommands::List { prefix } => {
            let value = match &prefix {
                Some(prefix) => client.get(&["parameters", "prefix", prefix.as_str()]).await?,
                None => client.get(&["parameters"]).await?,
            };
            let parameters = value["parameters"].as_array().cloned().unwrap_or_default();
            if parameters.is_empty() {
                return output_empty_collection(&output_format, "parameters", "No flags found");
            }
            match output_format {
                OutputFormat::Json => output_value(&output_format, &value),
                OutputFormat::Text => {
                    for p in &parameters {
                        println!("{}", flag_line(p));
                    }
                    Ok(())
                }
            }
        }
        ParamsCommands::Prefixes => {
            let value = client.get(&["parameters", "prefixes"]).await?;
            match output_format {
                OutputFormat::Json => output_value(&output_format, &value),
                OutputFormat::Text => {
                    for prefix in value["prefixes"].as_array().into_iter().flatten() {
                        println!("{}", prefix.as_str().unwrap_or_default());
                    }
                    Ok(())
                }
            }
        }
        ParamsCommands::Get { id, prefix } => {
            let value = client.get(&flag_path(prefix.as_deref(), &id)).await?;
            output_value(&output_format, &value)
        }
        ParamsCommands::Create {
            id,
            value,
            value_type,
            description,
            prefix,
            store_type,
            modified_by,
        } => {
            let mut body = Map::new();
            body.insert("id".into(), json!(id));
            body.insert("value".into(), json!(value));
            body.insert("type".into(), json!(value_type));
            insert_opt(&mut body, "description", description);
            insert_opt(&mut body, "prefix", prefix);
            insert_opt(&mut body, "parameterStoreType", store_type);
            insert_opt(&mut body, "lastModifiedBy", modified_by);

            let response = client.post(&["parameters"], &Value::Object(body)).await?;
            output_success(
                &output_format,
                &format!("Created flag {}", id),
                Some(response),
            )
        }
        ParamsCommands::Update {
            id,
            prefix,
            value,
            description,
            clear_description,
            value_type,
            modified_by,
        } => {
            let mut body = Map::new();
            insert_opt(&mut body, "value", value);
            insert_opt(&mut body, "description", description);
            if clear_description {
                body.insert("description".into(), Value::Null);
            }
            insert_opt(&mut body, "type", value_type);
            insert_opt(&mut body, "lastModifiedBy", modified_by);
            if body.is_empty() {
                anyhow::bail!("Nothing to update: pass --value, --description, --clear-description, --type or --modified-by");
            }

            let response = client
                .put(&flag_path(prefix.as_deref(), &id), &Value::Object(body))
                .await?;
            output_success(&output_format, &format!("Updated flag {}", id), Some(response))
        }
        ParamsCommands::Delete { id, prefix } => {
            let response = client.delete(&flag_path(prefix.as_deref(), &id)).await?;
            output_success(&output_format, &format!("Deleted flag {}", id), Some(response))
        }
        ParamsCommands::DeleteRef { arn } => {
            let response = client.delete(&["parameters", "arn", arn.as_str()]).await?;
            output_success(&output_format, &format!("Deleted {}", arn), Some(response))
        }
    }
}

fn flag_path<'a>(prefix: Option<&'a str>, id: &'a str) -> Vec<&'a str> {
    match prefix {
        Some(prefix) => vec!["parameters", prefix, id],
        None => vec!["parameters", id],
    }
}

fn insert_opt(body: &mut Map<String, Value>, key: &str, value: Option<String>) {
    if let Some(value) = value {
        body.insert(key.to_string(), json!(value));
    }
}

fn flag_line(p: &Value) -> String {
    let prefix = p["prefix"].as_str().unwrap_or_default();
    let id = p["id"].as_str().unwrap_or_default();
    let name = if prefix.is_empty() { id.to_string() } else { format!("{}/{}", prefix, id) };
    format!(
        "{:<40} {:<9} {}",
        name,
        p["type"].as_str().unwrap_or_default(),
        p["value"].as_str().unwrap_or_default()
    )
}
