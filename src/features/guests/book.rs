//! # Guest Book
//!
//! RSVP records: creation, lookup by phone, admin edits and removal, and the
//! derived `dish_claimed` flag.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Phone lookup compares digits only
//! - 1.0.0: Initial RSVP storage

use crate::core::{CookingSkill, Dish, Guest, PotluckError, PotluckResult};
use crate::database::{keys, BlobStore, Collection};
use chrono::Utc;
use log::info;
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

/// RSVP submission. Fields are optional so missing ones become validation errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewGuest {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub cooking_skill: Option<CookingSkill>,
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
    #[serde(default)]
    pub bringing_partner: bool,
}

/// Admin edit; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GuestUpdate {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub cooking_skill: Option<CookingSkill>,
    pub dietary_restrictions: Option<Vec<String>>,
    pub bringing_partner: Option<bool>,
}

/// Strip everything but digits so "(555) 123-4567" matches "5551234567"
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[derive(Clone)]
pub struct GuestBook {
    guests: Collection<Guest>,
}

impl GuestBook {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self {
            guests: Collection::new(store, keys::GUESTS),
        }
    }

    pub async fn list(&self) -> PotluckResult<Vec<Guest>> {
        Ok(self.guests.list().await?)
    }

    pub async fn get(&self, id: &str) -> PotluckResult<Guest> {
        self.guests
            .find(id)
            .await?
            .ok_or(PotluckError::NotFound("Guest"))
    }

    pub async fn create(&self, request: NewGuest) -> PotluckResult<Guest> {
        let name = non_blank(request.name);
        let phone_number = non_blank(request.phone_number);

        let (Some(name), Some(phone_number), Some(cooking_skill)) =
            (name, phone_number, request.cooking_skill)
        else {
            return Err(PotluckError::validation(
                "Missing required fields: name, phone_number, cooking_skill",
            ));
        };

        let guest = Guest {
            id: Uuid::new_v4().to_string(),
            name,
            phone_number,
            email: non_blank(request.email),
            cooking_skill,
            dietary_restrictions: clean_restrictions(request.dietary_restrictions),
            dish_claimed: false,
            bringing_partner: request.bringing_partner,
            created_at: Utc::now(),
        };

        let guest = self.guests.insert(guest).await?;
        info!("New RSVP from {} ({})", guest.name, guest.id);
        Ok(guest)
    }

    pub async fn find_by_phone(&self, phone: &str) -> PotluckResult<Guest> {
        let wanted = normalize_phone(phone);
        if wanted.is_empty() {
            return Err(PotluckError::validation("Missing phone number"));
        }

        self.guests
            .list()
            .await?
            .into_iter()
            .find(|g| normalize_phone(&g.phone_number) == wanted)
            .ok_or(PotluckError::NotFound("RSVP"))
    }

    pub async fn update(&self, id: &str, update: GuestUpdate) -> PotluckResult<Guest> {
        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(PotluckError::validation("Guest name cannot be blank"));
            }
        }

        let updated = self
            .guests
            .update_item(id, |guest| {
                if let Some(name) = &update.name {
                    guest.name = name.trim().to_string();
                }
                if let Some(phone) = &update.phone_number {
                    guest.phone_number = phone.trim().to_string();
                }
                if let Some(email) = &update.email {
                    guest.email = non_blank(Some(email.clone()));
                }
                if let Some(skill) = update.cooking_skill {
                    guest.cooking_skill = skill;
                }
                if let Some(restrictions) = &update.dietary_restrictions {
                    guest.dietary_restrictions = clean_restrictions(restrictions.clone());
                }
                if let Some(partner) = update.bringing_partner {
                    guest.bringing_partner = partner;
                }
            })
            .await?;

        updated.ok_or(PotluckError::NotFound("Guest"))
    }

    /// Remove a guest. Dishes that reference them are left in place.
    pub async fn delete(&self, id: &str) -> PotluckResult<()> {
        if self.guests.delete(id).await? {
            info!("Removed guest {id}");
            Ok(())
        } else {
            Err(PotluckError::NotFound("Guest"))
        }
    }

    /// Recompute `dish_claimed` for the given guests from the current dishes
    pub async fn sync_dish_flags(&self, guest_ids: &HashSet<String>, dishes: &[Dish]) -> PotluckResult<()> {
        if guest_ids.is_empty() {
            return Ok(());
        }

        let owners: HashSet<&str> = dishes
            .iter()
            .filter(|d| d.status.is_committed())
            .map(|d| d.guest_id.as_str())
            .collect();

        self.guests
            .update(|guests| {
                for guest in guests.iter_mut().filter(|g| guest_ids.contains(&g.id)) {
                    guest.dish_claimed = owners.contains(guest.id.as_str());
                }
            })
            .await?;

        Ok(())
    }
}

fn clean_restrictions(restrictions: Vec<String>) -> Vec<String> {
    restrictions
        .into_iter()
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect()
}
