// src/models/category.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'categories' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    /// Icon tag rendered by the client.
    pub icon: String,
    /// Color tag rendered by the client.
    pub color: String,
}

/// Insertable category data.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub name: String,
    pub icon: String,
    pub color: String,
}

/// The fixed default category set, seeded on first run and restored by the
/// dev-only reset endpoint. Names are the Polish UI labels.
pub fn default_categories() -> Vec<NewCategory> {
    [
        ("Elektronika", "cpu", "indigo"),
        ("Motoryzacja", "car", "red"),
        ("Nieruchomości", "building", "blue"),
        ("Dom i Ogród", "sofa", "green"),
        ("Moda", "shirt", "purple"),
        ("Rolnictwo", "wheat", "yellow"),
        ("Zwierzęta", "paw-print", "orange"),
        ("Dla Dzieci", "baby", "pink"),
        ("Sport i Hobby", "dumbbell", "indigo"),
        ("Muzyka i Edukacja", "music-4", "blue"),
        ("Firma i Przemysł", "factory", "gray"),
        ("Antyki i Kolekcje", "landmark", "brown"),
        ("Zdrowie i Uroda", "heart-pulse", "red"),
        ("Wypożyczalnia", "timer", "green"),
        ("Oddam za darmo", "gift", "purple"),
        ("Usługi", "tool", "indigo"),
        ("Noclegi", "bed", "blue"),
        ("Praca", "briefcase", "green"),
    ]
    .into_iter()
    .map(|(name, icon, color)| NewCategory {
        name: name.to_string(),
        icon: icon.to_string(),
        color: color.to_string(),
    })
    .collect()
}
