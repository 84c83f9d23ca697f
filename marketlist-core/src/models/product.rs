use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::unit::Unit;

/// Highest price accepted for a product.
pub const MAX_PRICE: f64 = 1_000_000_000.0;

/// Identifier of a product.
///
/// Products created on this device carry a timestamp-derived `Local` id until
/// they are synchronized; the remote store then assigns an opaque `Remote` id.
/// Serialized untagged: numbers are local ids, strings are remote ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductId {
    Local(i64),
    Remote(String),
}

impl ProductId {
    pub fn is_remote(&self) -> bool {
        matches!(self, ProductId::Remote(_))
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProductId::Local(id) => write!(f, "{}", id),
            ProductId::Remote(id) => f.write_str(id),
        }
    }
}

impl FromStr for ProductId {
    type Err = ProductError;

    /// Parses an id typed by a user: all-digit input is a local id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ProductError::EmptyId);
        }
        match s.parse::<i64>() {
            Ok(id) => Ok(ProductId::Local(id)),
            Err(_) => Ok(ProductId::Remote(s.to_string())),
        }
    }
}

/// Errors raised when validating product data.
#[derive(Error, Debug, PartialEq)]
pub enum ProductError {
    #[error("Field '{0}' is required")]
    MissingField(&'static str),

    #[error("Price must be a finite number between 0 and {max}, got {0}", max = MAX_PRICE)]
    InvalidPrice(f64),

    #[error("Product id cannot be empty")]
    EmptyId,
}

/// The body of a product document, everything except its id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductFields {
    pub tienda: String,
    pub categoria: String,
    pub nombre: String,
    pub marca: String,
    pub unidad: Unit,
    pub precio: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creacion: Option<DateTime<Utc>>,
}

impl ProductFields {
    pub fn new(
        tienda: impl Into<String>,
        categoria: impl Into<String>,
        nombre: impl Into<String>,
        marca: impl Into<String>,
        unidad: Unit,
        precio: f64,
    ) -> Self {
        Self {
            tienda: tienda.into(),
            categoria: categoria.into(),
            nombre: nombre.into(),
            marca: marca.into(),
            unidad,
            precio,
            creacion: None,
        }
    }

    pub fn with_creacion(mut self, creacion: DateTime<Utc>) -> Self {
        self.creacion = Some(creacion);
        self
    }

    /// Checks presence of the text fields and the price range.
    pub fn validate(&self) -> Result<(), ProductError> {
        let required = [
            ("tienda", &self.tienda),
            ("categoria", &self.categoria),
            ("nombre", &self.nombre),
            ("marca", &self.marca),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ProductError::MissingField(name));
            }
        }

        if !self.precio.is_finite() || self.precio < 0.0 || self.precio > MAX_PRICE {
            return Err(ProductError::InvalidPrice(self.precio));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub tienda: String,
    pub categoria: String,
    pub nombre: String,
    pub marca: String,
    pub unidad: Unit,
    pub precio: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creacion: Option<DateTime<Utc>>,
}

impl Product {
    pub fn from_fields(id: ProductId, fields: ProductFields) -> Self {
        Self {
            id,
            tienda: fields.tienda,
            categoria: fields.categoria,
            nombre: fields.nombre,
            marca: fields.marca,
            unidad: fields.unidad,
            precio: fields.precio,
            creacion: fields.creacion,
        }
    }

    pub fn fields(&self) -> ProductFields {
        ProductFields {
            tienda: self.tienda.clone(),
            categoria: self.categoria.clone(),
            nombre: self.nombre.clone(),
            marca: self.marca.clone(),
            unidad: self.unidad,
            precio: self.precio,
            creacion: self.creacion,
        }
    }

    /// Overwrites every field except the id.
    pub fn overwrite(&mut self, fields: ProductFields) {
        let id = self.id.clone();
        *self = Product::from_fields(id, fields);
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.nombre)?;
        writeln!(f, "{}", "=".repeat(self.nombre.chars().count()))?;
        writeln!(f, "ID:        {}", self.id)?;
        writeln!(f, "Tienda:    {}", self.tienda)?;
        writeln!(f, "Categoria: {}", self.categoria)?;
        writeln!(f, "Marca:     {}", self.marca)?;
        writeln!(f, "Precio:    {} / {}", self.precio, self.unidad)?;
        if let Some(creacion) = self.creacion {
            writeln!(f, "Creacion:  {}", creacion.format("%Y-%m-%d %H:%M"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn papa() -> ProductFields {
        ProductFields::new("A", "C1", "Papa", "M1", Unit::Kg, 1000.0)
    }

    #[test]
    fn test_product_id_serde_untagged() {
        let local: ProductId = serde_json::from_str("1718000000000").unwrap();
        assert_eq!(local, ProductId::Local(1718000000000));

        let remote: ProductId = serde_json::from_str("\"a1b2c3\"").unwrap();
        assert_eq!(remote, ProductId::Remote("a1b2c3".to_string()));

        assert_eq!(serde_json::to_string(&ProductId::Local(7)).unwrap(), "7");
    }

    #[test]
    fn test_product_id_from_str() {
        assert_eq!("42".parse::<ProductId>().unwrap(), ProductId::Local(42));
        assert_eq!(
            "xYz9".parse::<ProductId>().unwrap(),
            ProductId::Remote("xYz9".to_string())
        );
        assert_eq!("  ".parse::<ProductId>(), Err(ProductError::EmptyId));
    }

    #[test]
    fn test_validate_ok() {
        assert!(papa().validate().is_ok());
        let free = ProductFields::new("A", "C", "Bolsa", "M", Unit::Unidad, 0.0);
        assert!(free.validate().is_ok());
    }

    #[test]
    fn test_validate_missing_field() {
        let mut fields = papa();
        fields.marca = "   ".to_string();
        assert_eq!(fields.validate(), Err(ProductError::MissingField("marca")));
    }

    #[test]
    fn test_validate_price_range() {
        let mut fields = papa();
        fields.precio = -1.0;
        assert!(matches!(
            fields.validate(),
            Err(ProductError::InvalidPrice(_))
        ));

        fields.precio = f64::NAN;
        assert!(fields.validate().is_err());

        fields.precio = MAX_PRICE + 1.0;
        assert!(fields.validate().is_err());
    }

    #[test]
    fn test_product_json_matches_stored_format() {
        let json = r#"{"id":1718000000000,"tienda":"A","categoria":"C1","nombre":"Papa","marca":"M1","unidad":"kg","precio":1000}"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, ProductId::Local(1718000000000));
        assert_eq!(product.unidad, Unit::Kg);
        assert_eq!(product.precio, 1000.0);
        assert!(product.creacion.is_none());
    }

    #[test]
    fn test_overwrite_keeps_id() {
        let mut product = Product::from_fields(ProductId::Local(1), papa());
        let mut fields = papa();
        fields.nombre = "Papa criolla".to_string();
        fields.precio = 1200.0;

        product.overwrite(fields.clone());

        assert_eq!(product.id, ProductId::Local(1));
        assert_eq!(product.fields(), fields);
    }
}
