use clap::{Args, Subcommand};
use std::io::{self, Write};

use marketlist_core::{LocalStore, Product, ProductCatalog, ProductFields, ProductId, Unit};

use super::OutputFormat;

#[derive(Args)]
pub struct ProductCommand {
    #[command(subcommand)]
    pub command: ProductSubcommand,
}

#[derive(Subcommand)]
pub enum ProductSubcommand {
    /// Add a product to the local list
    Create {
        /// Store where the product is bought
        #[arg(long)]
        tienda: String,

        /// Product category
        #[arg(long)]
        categoria: String,

        /// Product name
        #[arg(long)]
        nombre: String,

        /// Brand
        #[arg(long)]
        marca: String,

        /// Unit of sale (kg, lb, unidad)
        #[arg(long)]
        unidad: Unit,

        /// Price per unit
        #[arg(long)]
        precio: f64,
    },

    /// List all products
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Filter by store
        #[arg(long)]
        tienda: Option<String>,
    },

    /// Show a product's details
    Show {
        /// Product ID
        id: ProductId,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Update an existing product
    Update {
        /// Product ID
        id: ProductId,

        #[arg(long)]
        tienda: Option<String>,

        #[arg(long)]
        categoria: Option<String>,

        #[arg(long)]
        nombre: Option<String>,

        #[arg(long)]
        marca: Option<String>,

        #[arg(long)]
        unidad: Option<Unit>,

        #[arg(long)]
        precio: Option<f64>,
    },

    /// Delete a product
    Delete {
        /// Product ID
        id: ProductId,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl ProductCommand {
    pub fn run<S: LocalStore>(
        &self,
        catalog: &ProductCatalog<S>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ProductSubcommand::Create {
                tienda,
                categoria,
                nombre,
                marca,
                unidad,
                precio,
            } => {
                let fields = ProductFields::new(
                    tienda.trim(),
                    categoria.trim(),
                    nombre.trim(),
                    marca.trim(),
                    *unidad,
                    *precio,
                );

                let created = catalog.create(fields)?;
                println!("Created product:");
                println!("{}", created);
                Ok(())
            }

            ProductSubcommand::List { format, tienda } => {
                let products = catalog.list();

                let products: Vec<_> = if let Some(tienda) = tienda {
                    let tienda_lower = tienda.to_lowercase();
                    products
                        .into_iter()
                        .filter(|p| p.tienda.to_lowercase() == tienda_lower)
                        .collect()
                } else {
                    products
                };

                if products.is_empty() {
                    println!("No products found");
                    return Ok(());
                }

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&products)?);
                    }
                    OutputFormat::Text => print_table(&products),
                }
                Ok(())
            }

            ProductSubcommand::Show { id, format } => {
                let product = catalog
                    .get(id)
                    .ok_or_else(|| format!("Product not found: {}", id))?;

                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&product)?);
                    }
                    OutputFormat::Text => {
                        println!("{}", product);
                    }
                }
                Ok(())
            }

            ProductSubcommand::Update {
                id,
                tienda,
                categoria,
                nombre,
                marca,
                unidad,
                precio,
            } => {
                let has_updates = tienda.is_some()
                    || categoria.is_some()
                    || nombre.is_some()
                    || marca.is_some()
                    || unidad.is_some()
                    || precio.is_some();

                if !has_updates {
                    return Err("Nothing to update. Provide at least one option.".into());
                }

                let current = catalog
                    .get(id)
                    .ok_or_else(|| format!("Product not found: {}", id))?;

                // Unspecified options keep their value; the record is still
                // overwritten as a whole.
                let mut fields = current.fields();
                if let Some(tienda) = tienda {
                    fields.tienda = tienda.trim().to_string();
                }
                if let Some(categoria) = categoria {
                    fields.categoria = categoria.trim().to_string();
                }
                if let Some(nombre) = nombre {
                    fields.nombre = nombre.trim().to_string();
                }
                if let Some(marca) = marca {
                    fields.marca = marca.trim().to_string();
                }
                if let Some(unidad) = unidad {
                    fields.unidad = *unidad;
                }
                if let Some(precio) = precio {
                    fields.precio = *precio;
                }

                let updated = catalog.update(id, fields)?;
                println!("Updated product:");
                println!("{}", updated);
                Ok(())
            }

            ProductSubcommand::Delete { id, force } => {
                let product = catalog
                    .get(id)
                    .ok_or_else(|| format!("Product not found: {}", id))?;

                if !force {
                    print!("Delete product '{}'? [y/N] ", product.nombre);
                    io::stdout().flush()?;

                    let mut input = String::new();
                    io::stdin().read_line(&mut input)?;

                    if !input.trim().eq_ignore_ascii_case("y") {
                        println!("Deletion cancelled.");
                        return Ok(());
                    }
                }

                let removed = catalog.delete(id)?;
                println!("Deleted product: {}", removed.nombre);
                Ok(())
            }
        }
    }
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() > width {
        let cut: String = value.chars().take(width - 3).collect();
        format!("{}...", cut)
    } else {
        value.to_string()
    }
}

fn print_table(products: &[Product]) {
    println!(
        "{:<36}  {:<24}  {:<16}  {:>12}  UNIDAD",
        "ID", "NOMBRE", "TIENDA", "PRECIO"
    );
    println!("{}", "-".repeat(102));
    for product in products {
        println!(
            "{:<36}  {:<24}  {:<16}  {:>12.2}  {}",
            product.id.to_string(),
            truncate(&product.nombre, 24),
            truncate(&product.tienda, 16),
            product.precio,
            product.unidad
        );
    }
    println!("\nTotal: {} product(s)", products.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketlist_core::MemoryStore;

    fn create(catalog: &ProductCatalog<MemoryStore>, nombre: &str) -> Product {
        catalog
            .create(ProductFields::new("A", "C1", nombre, "M1", Unit::Kg, 1000.0))
            .unwrap()
    }

    #[test]
    fn test_create_command_persists() {
        let catalog = ProductCatalog::new(MemoryStore::new());
        let cmd = ProductCommand {
            command: ProductSubcommand::Create {
                tienda: " Exito ".to_string(),
                categoria: "Verduras".to_string(),
                nombre: "Papa".to_string(),
                marca: "Campo".to_string(),
                unidad: Unit::Kg,
                precio: 1000.0,
            },
        };

        cmd.run(&catalog).unwrap();

        let products = catalog.list();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].tienda, "Exito");
    }

    #[test]
    fn test_create_command_rejects_bad_price() {
        let catalog = ProductCatalog::new(MemoryStore::new());
        let cmd = ProductCommand {
            command: ProductSubcommand::Create {
                tienda: "Exito".to_string(),
                categoria: "Verduras".to_string(),
                nombre: "Papa".to_string(),
                marca: "Campo".to_string(),
                unidad: Unit::Kg,
                precio: -1.0,
            },
        };

        assert!(cmd.run(&catalog).is_err());
        assert!(catalog.list().is_empty());
    }

    #[test]
    fn test_update_keeps_unspecified_fields() {
        let catalog = ProductCatalog::new(MemoryStore::new());
        let papa = create(&catalog, "Papa");
        let cmd = ProductCommand {
            command: ProductSubcommand::Update {
                id: papa.id.clone(),
                tienda: None,
                categoria: None,
                nombre: None,
                marca: None,
                unidad: Some(Unit::Lb),
                precio: Some(550.0),
            },
        };

        cmd.run(&catalog).unwrap();

        let updated = catalog.get(&papa.id).unwrap();
        assert_eq!(updated.nombre, "Papa");
        assert_eq!(updated.unidad, Unit::Lb);
        assert_eq!(updated.precio, 550.0);
        assert_eq!(updated.creacion, papa.creacion);
    }

    #[test]
    fn test_update_without_options_fails() {
        let catalog = ProductCatalog::new(MemoryStore::new());
        let papa = create(&catalog, "Papa");
        let cmd = ProductCommand {
            command: ProductSubcommand::Update {
                id: papa.id,
                tienda: None,
                categoria: None,
                nombre: None,
                marca: None,
                unidad: None,
                precio: None,
            },
        };

        let err = cmd.run(&catalog).unwrap_err();
        assert!(err.to_string().contains("Nothing to update"));
    }

    #[test]
    fn test_forced_delete() {
        let catalog = ProductCatalog::new(MemoryStore::new());
        let papa = create(&catalog, "Papa");
        let yuca = create(&catalog, "Yuca");
        let cmd = ProductCommand {
            command: ProductSubcommand::Delete {
                id: papa.id,
                force: true,
            },
        };

        cmd.run(&catalog).unwrap();

        assert_eq!(catalog.list(), vec![yuca]);
    }

    #[test]
    fn test_show_missing_product() {
        let catalog = ProductCatalog::new(MemoryStore::new());
        let cmd = ProductCommand {
            command: ProductSubcommand::Show {
                id: ProductId::Local(42),
                format: OutputFormat::Text,
            },
        };

        let err = cmd.run(&catalog).unwrap_err();
        assert_eq!(err.to_string(), "Product not found: 42");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Papa", 10), "Papa");
        assert_eq!(truncate("Papa criolla amarilla", 10), "Papa cr...");
    }
}
