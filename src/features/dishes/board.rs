//! # Dish Board
//!
//! Dishes guests are bringing and dishes the host or a guest has asked for.
//! Every mutation re-derives `dish_claimed` for the guests it touched.
//!
//! - **Version**: 1.2.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.2.0: Explicit claim of requested dishes
//! - 1.1.0: Host requests with placeholder owner
//! - 1.0.0: Initial dish storage

use crate::core::{
    Dish, DishCategory, DishStatus, PotluckError, PotluckResult, HOST_PLACEHOLDER_ID,
};
use crate::database::{keys, BlobStore, Collection};
use crate::features::guests::GuestBook;
use chrono::Utc;
use log::info;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// Guest claim, suggestion acceptance, or guest request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewDish {
    pub guest_id: Option<String>,
    pub guest_name: Option<String>,
    pub category: Option<DishCategory>,
    pub dish_name: Option<String>,
    pub serves: Option<u32>,
    pub status: Option<DishStatus>,
    pub recipe: Option<String>,
}

/// Host asks for a dish nobody has committed to yet
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HostRequest {
    pub category: Option<DishCategory>,
    pub dish_name: Option<String>,
    pub serves: Option<u32>,
}

/// Who is claiming a requested dish
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaimRequest {
    pub guest_id: Option<String>,
    pub guest_name: Option<String>,
}

/// Admin edit; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DishUpdate {
    pub guest_id: Option<String>,
    pub guest_name: Option<String>,
    pub category: Option<DishCategory>,
    pub dish_name: Option<String>,
    pub serves: Option<u32>,
    pub status: Option<DishStatus>,
    pub recipe: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct DishBoard {
    dishes: Collection<Dish>,
    guests: GuestBook,
}

impl DishBoard {
    pub fn new(store: Arc<dyn BlobStore>, guests: GuestBook) -> Self {
        Self {
            dishes: Collection::new(store, keys::DISHES),
            guests,
        }
    }

    pub async fn list(&self) -> PotluckResult<Vec<Dish>> {
        Ok(self.dishes.list().await?)
    }

    pub async fn create(&self, request: NewDish) -> PotluckResult<Dish> {
        let (Some(guest_id), Some(guest_name), Some(category), Some(dish_name)) = (
            non_blank(request.guest_id),
            non_blank(request.guest_name),
            request.category,
            non_blank(request.dish_name),
        ) else {
            return Err(PotluckError::validation(
                "Missing required fields: guest_id, guest_name, category, dish_name",
            ));
        };

        let dish = Dish {
            id: Uuid::new_v4().to_string(),
            guest_id,
            guest_name,
            category,
            dish_name,
            serves: request.serves,
            status: request.status.unwrap_or_default(),
            recipe: request.recipe,
            created_at: Utc::now(),
        };

        let dish = self.dishes.insert(dish).await?;
        info!(
            "{} added {} '{}' ({})",
            dish.guest_name,
            dish.category,
            dish.dish_name,
            if dish.status.is_committed() { "claimed" } else { "requested" }
        );

        self.sync_owners(HashSet::from([dish.guest_id.clone()])).await?;
        Ok(dish)
    }

    pub async fn request_as_host(&self, request: HostRequest) -> PotluckResult<Dish> {
        self.create(NewDish {
            guest_id: Some(HOST_PLACEHOLDER_ID.to_string()),
            guest_name: Some("Host".to_string()),
            category: request.category,
            dish_name: request.dish_name,
            serves: request.serves,
            status: Some(DishStatus::Requested),
            recipe: None,
        })
        .await
    }

    /// Commit to bringing a requested dish
    pub async fn claim(&self, id: &str, request: ClaimRequest) -> PotluckResult<Dish> {
        let (Some(guest_id), Some(guest_name)) =
            (non_blank(request.guest_id), non_blank(request.guest_name))
        else {
            return Err(PotluckError::validation(
                "Missing required fields: guest_id, guest_name",
            ));
        };

        let current = self
            .dishes
            .find(id)
            .await?
            .ok_or(PotluckError::NotFound("Dish"))?;
        if current.status != DishStatus::Requested {
            return Err(PotluckError::validation("Dish has already been claimed"));
        }

        let mut previous_owner = None;
        let mut raced = false;
        let claimed = self
            .dishes
            .update_item(id, |dish| {
                raced = dish.status != DishStatus::Requested;
                if raced {
                    return;
                }
                previous_owner = Some(dish.guest_id.clone());
                dish.guest_id = guest_id.clone();
                dish.guest_name = guest_name.clone();
                dish.status = DishStatus::Claimed;
            })
            .await?
            .ok_or(PotluckError::NotFound("Dish"))?;

        if raced {
            return Err(PotluckError::validation("Dish has already been claimed"));
        }

        info!("{} claimed requested dish '{}'", claimed.guest_name, claimed.dish_name);

        let mut affected = HashSet::from([claimed.guest_id.clone()]);
        affected.extend(previous_owner);
        self.sync_owners(affected).await?;
        Ok(claimed)
    }

    pub async fn update(&self, id: &str, update: DishUpdate) -> PotluckResult<Dish> {
        if let Some(name) = &update.dish_name {
            if name.trim().is_empty() {
                return Err(PotluckError::validation("Dish name cannot be blank"));
            }
        }

        let mut previous_owner = None;
        let updated = self
            .dishes
            .update_item(id, |dish| {
                previous_owner = Some(dish.guest_id.clone());
                if let Some(guest_id) = &update.guest_id {
                    dish.guest_id = guest_id.clone();
                }
                if let Some(guest_name) = &update.guest_name {
                    dish.guest_name = guest_name.clone();
                }
                if let Some(category) = update.category {
                    dish.category = category;
                }
                if let Some(name) = &update.dish_name {
                    dish.dish_name = name.trim().to_string();
                }
                if let Some(serves) = update.serves {
                    dish.serves = Some(serves);
                }
                if let Some(status) = update.status {
                    dish.status = status;
                }
                if let Some(recipe) = &update.recipe {
                    dish.recipe = Some(recipe.clone());
                }
            })
            .await?
            .ok_or(PotluckError::NotFound("Dish"))?;

        let mut affected = HashSet::from([updated.guest_id.clone()]);
        affected.extend(previous_owner);
        self.sync_owners(affected).await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> PotluckResult<()> {
        let dish = self
            .dishes
            .find(id)
            .await?
            .ok_or(PotluckError::NotFound("Dish"))?;

        if !self.dishes.delete(id).await? {
            return Err(PotluckError::NotFound("Dish"));
        }

        info!("Removed dish '{}' ({})", dish.dish_name, dish.id);
        self.sync_owners(HashSet::from([dish.guest_id])).await
    }

    async fn sync_owners(&self, guest_ids: HashSet<String>) -> PotluckResult<()> {
        let dishes = self.dishes.list().await?;
        self.guests.sync_dish_flags(&guest_ids, &dishes).await
    }
}
