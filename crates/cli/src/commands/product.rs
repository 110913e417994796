//! Product catalog commands

use anyhow::Result;
use clap::Subcommand;
use serde_json::json;

use tienda_common::Product;

use crate::client::ApiClient;
use crate::output::{self, OutputFormat, TableDisplay};

#[derive(Subcommand, Debug)]
pub enum ProductCommands {
    /// List all products
    List,

    /// Show a product
    Get { id: i64 },

    /// Create a product
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: f64,
        #[arg(long)]
        description: String,
        #[arg(long)]
        stock: i64,
        #[arg(long)]
        category_id: i64,
        #[arg(long)]
        brand_id: i64,
        #[arg(long)]
        img: String,
    },

    /// Delete a product
    Delete { id: i64 },
}

impl TableDisplay for Product {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "NAME", "PRICE", "STOCK", "CATEGORY", "BRAND"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            format!("{:.2}", self.price),
            self.stock.to_string(),
            self.category_name.clone().unwrap_or_default(),
            self.brand_name.clone().unwrap_or_default(),
        ]
    }
}

pub async fn execute(cmd: ProductCommands, client: ApiClient, format: OutputFormat) -> Result<()> {
    match cmd {
        ProductCommands::List => {
            let response = client.get("/api/products").await?;
            let products: Vec<Product> = serde_json::from_value(response)?;
            output::print_list(&products, format);
        }

        ProductCommands::Get { id } => {
            let response = client.get(&format!("/api/products/{}", id)).await?;
            let product: Product = serde_json::from_value(response)?;
            output::print_item(&product, format);
        }

        ProductCommands::Create {
            name,
            price,
            description,
            stock,
            category_id,
            brand_id,
            img,
        } => {
            let body = json!({
                "name": name,
                "price": price,
                "description": description,
                "stock": stock,
                "category_id": category_id,
                "brand_id": brand_id,
                "img": img,
            });
            let response = client.post("/api/products", &body).await?;
            let product: Product = serde_json::from_value(response)?;
            output::print_success(&format!("Created product {} ({})", product.name, product.id));
        }

        ProductCommands::Delete { id } => {
            client.delete(&format!("/api/products/{}", id)).await?;
            output::print_success(&format!("Deleted product {}", id));
        }
    }

    Ok(())
}
