use clap::Subcommand;
use serde_json::{json, Map, Value};

use crate::cli::client::ApiClient;
use crate::cli::utils::{output_empty_collection, output_success, output_value};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum UsersCommands {
    #[command(about = "List users")]
    List,

    #[command(about = "Show one user")]
    Get {
        #[arg(help = "User id (email)")]
        id: String,
    },

    #[command(about = "Create a user")]
    Create {
        #[arg(help = "User id (email)")]
        id: String,
        #[arg(help = "Display name")]
        nome: String,
        #[arg(long, help = "Grant read permission")]
        leitura: bool,
        #[arg(long, help = "Grant write permission")]
        escrita: bool,
        #[arg(long, help = "Grant admin permission")]
        admin: bool,
        #[arg(long, help = "Create the user as inactive")]
        inactive: bool,
    },

    #[command(about = "Update a user; unspecified fields are kept")]
    Update {
        #[arg(help = "User id (email)")]
        id: String,
        #[arg(long, help = "New display name")]
        nome: Option<String>,
        #[arg(long, help = "Read permission (true/false)")]
        leitura: Option<bool>,
        #[arg(long, help = "Write permission (true/false)")]
        escrita: Option<bool>,
        #[arg(long, help = "Admin permission (true/false)")]
        admin: Option<bool>,
        #[arg(long, help = "Active flag (true/false)")]
        ativo: Option<bool>,
    },

    #[command(about = "Delete a user")]
    Delete {
        #[arg(help = "User id (email)")]
        id: String,
    },
}

pub async fn handle(cmd: UsersCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UsersCommands::List => {
            let value = client.get(&["users"]).await?;
            let users = value["usuarios"].as_array().cloned().unwrap_or_default();
            if users.is_empty() {
                return output_empty_collection(&output_format, "usuarios", "No users found");
            }
            match output_format {
                OutputFormat::Json => output_value(&output_format, &value),
                OutputFormat::Text => {
                    for user in &users {
                        println!("{}", user_line(user));
                    }
                    Ok(())
                }
            }
        }
        UsersCommands::Get { id } => {
            let value = client.get(&["users", id.as_str()]).await?;
            output_value(&output_format, &value)
        }
        UsersCommands::Create {
            id,
            nome,
            leitura,
            escrita,
            admin,
            inactive,
        } => {
            let body = json!({
                "id": id,
                "nome": nome,
                "permissoes": {"leitura": leitura, "escrita": escrita, "admin": admin},
                "ativo": !inactive,
            });
            let response = client.post(&["users"], &body).await?;
            output_success(&output_format, &format!("Created user {}", id), Some(response))
        }
        UsersCommands::Update {
            id,
            nome,
            leitura,
            escrita,
            admin,
            ativo,
        } => {
            let mut permissoes = Map::new();
            for (key, bit) in [("leitura", leitura), ("escrita", escrita), ("admin", admin)] {
                if let Some(bit) = bit {
                    permissoes.insert(key.to_string(), json!(bit));
                }
            }

            let mut body = Map::new();
            if let Some(nome) = nome {
                body.insert("nome".into(), json!(nome));
            }
            if !permissoes.is_empty() {
                body.insert("permissoes".into(), Value::Object(permissoes));
            }
            if let Some(ativo) = ativo {
                body.insert("ativo".into(), json!(ativo));
            }
            if body.is_empty() {
                anyhow::bail!("Nothing to update: pass --nome, --leitura, --escrita, --admin or --ativo");
            }

            let response = client.put(&["users", id.as_str()], &Value::Object(body)).await?;
            output_success(&output_format, &format!("Updated user {}", id), Some(response))
        }
        UsersCommands::Delete { id } => {
            let response = client.delete(&["users", id.as_str()]).await?;
            output_success(&output_format, &format!("Deleted user {}", id), Some(response))
        }
    }
}

fn user_line(user: &Value) -> String {
    let bits = &user["permissoes"];
    let flag = |key: &str, letter: char| if bits[key].as_bool().unwrap_or(false) { letter } else { '-' };
    format!(
        "{}{}{} {} {:<32} {}",
        flag("leitura", 'r'),
        flag("escrita", 'w'),
        flag("admin", 'a'),
        if user["ativo"].as_bool().unwrap_or(false) { "active  " } else { "inactive" },
        user["id"].as_str().unwrap_or_default(),
        user["nome"].as_str().unwrap_or_default()
    )
}
