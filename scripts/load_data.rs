//! Seed script for the Pet Haven document store.
//!
//! Populates the static reference collections (`categories`, `encourage`)
//! and a bootstrap admin account, so that role elevation is reachable on a
//! fresh deployment. Safe to re-run: existing documents are left alone.
//!
//! Run: cargo run --bin load_data

use serde_json::json;
use std::env;

use pet_haven::storage::{collections, Filter, Storage};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let data_dir = env::var("DATA_DIR").unwrap_or_else(|_| "pethaven_data".to_string());
    let storage = Storage::open(&data_dir)?;

    // Adoption categories, in the shape the frontend's category picker
    // expects ({value, label})
    let categories = [
        ("dog", "Dogs"),
        ("cat", "Cats"),
        ("rabbit", "Rabbits"),
        ("bird", "Birds"),
        ("fish", "Fish"),
    ];
    let mut seeded = 0;
    for (value, label) in categories {
        let filter = Filter::all().eq("value", json!(value));
        if storage
            .find_one(collections::CATEGORIES, &filter)
            .await?
            .is_none()
        {
            storage
                .insert_one(
                    collections::CATEGORIES,
                    json!({ "value": value, "label": label }),
                )
                .await?;
            seeded += 1;
        }
    }
    println!("categories: {seeded} new, {} total", categories.len());

    let encourages = [
        (
            "Adopt, don't shop",
            "Every adoption frees up shelter space for another animal in need.",
        ),
        (
            "Seniors need homes too",
            "Older pets are calmer, house-trained, and endlessly grateful.",
        ),
        (
            "Foster first",
            "Not ready to commit? Fostering saves lives one weekend at a time.",
        ),
    ];
    let mut seeded = 0;
    for (title, description) in encourages {
        let filter = Filter::all().eq("title", json!(title));
        if storage
            .find_one(collections::ENCOURAGE, &filter)
            .await?
            .is_none()
        {
            storage
                .insert_one(
                    collections::ENCOURAGE,
                    json!({ "title": title, "description": description }),
                )
                .await?;
            seeded += 1;
        }
    }
    println!("encourage: {seeded} new, {} total", encourages.len());

    // Bootstrap admin, so the elevation endpoint has a first caller
    let admin_email = env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@pethaven.io".to_string());
    let filter = Filter::all().eq("email", json!(admin_email));
    if storage
        .find_one(collections::USERS, &filter)
        .await?
        .is_none()
    {
        storage
            .insert_one(
                collections::USERS,
                json!({ "email": admin_email, "role": "admin", "name": "Pet Haven Admin" }),
            )
            .await?;
        println!("admin user created: {admin_email}");
    } else {
        println!("admin user already present: {admin_email}");
    }

    Ok(())
}
