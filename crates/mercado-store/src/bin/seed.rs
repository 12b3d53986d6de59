//! # Seed Data Generator
//!
//! Populates a development database with the demo grocery catalog.
//!
//! ## Usage
//! ```bash
//! cargo run -p mercado-store --bin seed
//! cargo run -p mercado-store --bin seed -- --db ./data/mercado.db
//! ```
//!
//! Each seeded product gets an opening `reception` movement so the ledger
//! reconciles with the cached stock from the very first row.

use chrono::Utc;
use std::env;
use uuid::Uuid;

use mercado_core::{BundleOffer, Category, MovementType, Product, StockMovement};
use mercado_store::{Database, StoreConfig};

/// Demo catalog rows: (id, name, price_cents, weight, category,
/// discount_bps, bundle tiers as (quantity, price_cents), opening stock).
#[allow(clippy::type_complexity)]
const CATALOG: &[(
    &str,
    &str,
    i64,
    &str,
    &str,
    Option<u32>,
    &[(i64, i64)],
    i64,
)] = &[
    ("P001", "Manzanas Rojas", 1000, "1kg", "Frutas y Verduras", Some(1500), &[], 100),
    ("P002", "Leche PIL", 600, "1L", "Lácteos y Huevos", None, &[], 100),
    ("P003", "Pechuga de Pollo", 2500, "1kg", "Carnes y Aves", None, &[], 100),
    ("P004", "Pan Marraqueta", 100, "unidad", "Panadería", None, &[], 100),
    ("P005", "Arroz Grano de Oro", 1200, "1kg", "Despensa", Some(1000), &[], 100),
    ("P006", "Bounty Minis", 800, "200g", "Dulces y Snacks", None, &[(3, 2000)], 100),
    ("P007", "Coca-Cola 2L", 1000, "2L", "Bebidas", None, &[(6, 5500), (12, 10000)], 100),
    ("P008", "Jabón Dove", 700, "90g", "Cuidado Personal", None, &[], 100),
    ("P009", "Detergente OLA", 3000, "2kg", "Limpieza", None, &[], 120),
    ("P010", "Yogurt Griego", 900, "150g", "Lácteos y Huevos", Some(500), &[], 100),
    ("P011", "Tomates", 800, "1kg", "Frutas y Verduras", None, &[], 100),
    ("P012", "Café Copacabana", 3500, "250g", "Café y Té", None, &[], 100),
    ("P013", "Queso Feta Criollo", 2500, "200g", "Lácteos y Huevos", Some(2200), &[], 100),
    ("P014", "Queso Mozzarella", 2800, "200g", "Lácteos y Huevos", None, &[], 100),
    ("P015", "Queso Gouda Liebedank", 3800, "300g", "Lácteos y Huevos", None, &[(2, 7000)], 100),
    ("P016", "Snickers Minis", 1500, "200g", "Dulces y Snacks", None, &[], 100),
    ("P017", "Skittles Frutas", 500, "38g", "Dulces y Snacks", Some(1000), &[], 8),
    ("P018", "M&M's Chocolate", 700, "45g", "Dulces y Snacks", Some(1000), &[], 5),
    ("P019", "M&M's Maní", 1900, "145g", "Dulces y Snacks", Some(1000), &[], 100),
    ("P020", "Galletas Chio Rio", 1000, "200g", "Dulces y Snacks", None, &[], 100),
    ("P021", "Huevos de Granja", 1500, "Docena", "Lácteos y Huevos", None, &[], 15),
];

const CATEGORIES: &[(&str, &str)] = &[
    ("ofertas-cat", "Ofertas y Promociones"),
    ("frutas-verduras", "Frutas y Verduras"),
    ("lacteos-huevos", "Lácteos y Huevos"),
    ("carnes-aves", "Carnes y Aves"),
    ("panaderia", "Panadería"),
    ("despensa", "Despensa"),
    ("dulces-snacks", "Dulces y Snacks"),
    ("bebidas", "Bebidas"),
    ("cuidado-personal", "Cuidado Personal"),
    ("limpieza", "Limpieza"),
    ("comida-lista", "Comida Lista"),
    ("cafe-te", "Café y Té"),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let db_path = parse_db_path().unwrap_or_else(|| "./mercado.db".to_string());
    println!("Seeding database at {db_path}");

    let db = Database::new(StoreConfig::new(&db_path)).await?;
    let products = db.products();
    let ledger = db.ledger();
    let now = Utc::now();

    for (id, name) in CATEGORIES {
        let category = Category {
            id: id.to_string(),
            name: name.to_string(),
            subcategories: if *id == "dulces-snacks" {
                vec![
                    "Todos".to_string(),
                    "Favoritos".to_string(),
                    "Chocolates".to_string(),
                    "Caramelos".to_string(),
                    "Galletas".to_string(),
                ]
            } else {
                vec![]
            },
        };
        products.insert_category(&category).await?;
    }

    for (id, name, price_cents, weight, category, discount_bps, tiers, opening_stock) in CATALOG {
        let product = Product {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            category: category.to_string(),
            weight: Some(weight.to_string()),
            image_url: None,
            tags: vec![],
            price_cents: *price_cents,
            cost_cents: None,
            discount_bps: *discount_bps,
            bundle_offers: tiers
                .iter()
                .map(|(quantity, price_cents)| BundleOffer {
                    quantity: *quantity,
                    price_cents: *price_cents,
                })
                .collect(),
            stock: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        products.insert(&product).await?;

        // Opening stock arrives through the ledger so it reconciles.
        let movement = StockMovement::new(
            Uuid::new_v4().to_string(),
            product.id.clone(),
            *opening_stock,
            MovementType::Reception,
            Some("Inventario inicial".to_string()),
            now,
        );
        ledger.record_movement(&movement).await?;
    }

    println!(
        "Seeded {} categories and {} products",
        CATEGORIES.len(),
        CATALOG.len()
    );
    Ok(())
}

fn parse_db_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1).cloned())
}
