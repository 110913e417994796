//! Category commands

use anyhow::Result;
use clap::Subcommand;
use serde_json::json;

use tienda_common::Category;

use crate::client::ApiClient;
use crate::output::{self, OutputFormat, TableDisplay};

#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// List all categories
    List,

    /// Create a category
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
    },

    /// Delete a category
    Delete { id: i64 },
}

impl TableDisplay for Category {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "NAME", "DESCRIPTION"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.id.to_string(), self.name.clone(), self.description.clone()]
    }
}

pub async fn execute(cmd: CategoryCommands, client: ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        CategoryCommands::List => {
            let response = client.get("/api/categories").await?;
            let categories: Vec<Category> = serde_json::from_value(response)?;
            output::print_list(&categories, format);
        }

        CategoryCommands::Create { name, description } => {
            let body = json!({"name": name, "description": description});
            let response = client.post("/api/categories", &body).await?;
            output::print_success(&format!(
                "Created category {} ({})",
                name,
                response["id"].as_i64().unwrap_or_default()
            ));
        }

        CategoryCommands::Delete { id } => {
            client.delete(&format!("/api/categories/{}", id)).await?;
            output::print_success(&format!("Deleted category {}", id));
        }
    }

    Ok(())
}
