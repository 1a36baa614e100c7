//! District registry service.

use civiq_common::{AppError, AppResult, IdGenerator};
use civiq_db::{
    entities::district::{self, DistrictStatus},
    repositories::DistrictRepository,
};
use sea_orm::{ActiveEnum, Set};
use serde::Deserialize;
use validator::Validate;

use crate::services::account::AccountService;
use crate::services::gate::{AuthorizationGate, Identity, Role};

/// Input for creating a district.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDistrictInput {
    #[validate(length(min = 1, max = 256))]
    pub name: String,

    #[validate(length(min = 1, max = 128))]
    pub country: String,

    #[validate(length(min = 1, max = 128))]
    pub region: String,

    /// Caller-supplied status, `ACTIVE` or `INACTIVE`
    pub status: String,

    /// GeoJSON Polygon string, persisted verbatim
    pub geo: String,

    pub area: f64,

    /// Two-element `[longitude, latitude]` pair
    pub centroid: serde_json::Value,
}

/// District registry service.
#[derive(Clone)]
pub struct DistrictService {
    district_repo: DistrictRepository,
    account_service: AccountService,
    gate: AuthorizationGate,
    id_gen: IdGenerator,
}

impl DistrictService {
    /// Create a new district service.
    #[must_use]
    pub const fn new(
        district_repo: DistrictRepository,
        account_service: AccountService,
        gate: AuthorizationGate,
    ) -> Self {
        Self {
            district_repo,
            account_service,
            gate,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a district. ADMIN only.
    pub async fn create(
        &self,
        identity: &Identity,
        input: CreateDistrictInput,
    ) -> AppResult<district::Model> {
        self.gate.authorize(identity, &[Role::Admin]).await?;
        input.validate()?;

        validate_polygon(&input.geo)?;
        validate_centroid(&input.centroid)?;

        let status = DistrictStatus::try_from_value(&input.status)
            .map_err(|_| AppError::InvalidInput("Status must be ACTIVE or INACTIVE".to_string()))?;

        let model = district::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(input.name),
            country: Set(input.country),
            region: Set(input.region),
            status: Set(status),
            geo: Set(input.geo),
            area: Set(input.area),
            centroid: Set(input.centroid),
            created_at: Set(chrono::Utc::now().into()),
        };

        let created = self.district_repo.create(model).await?;

        tracing::info!(district_id = %created.id, name = %created.name, "District created");
        Ok(created)
    }

    /// Get a district by ID.
    pub async fn get_by_id(&self, id: &str) -> AppResult<district::Model> {
        self.district_repo.get_by_id(id).await
    }

    /// List all districts, oldest first.
    pub async fn list_all(&self) -> AppResult<Vec<district::Model>> {
        self.district_repo.find_all().await
    }

    /// Set a district's status. ADMIN only.
    ///
    /// Going INACTIVE blocks every agent assigned to the district. Going
    /// back to ACTIVE does not unblock them.
    pub async fn set_status(
        &self,
        identity: &Identity,
        id: &str,
        status: &str,
    ) -> AppResult<district::Model> {
        self.gate.authorize(identity, &[Role::Admin]).await?;

        let new_status = DistrictStatus::try_from_value(&status.to_string())
            .map_err(|_| AppError::InvalidInput("Status must be ACTIVE or INACTIVE".to_string()))?;

        let district = self.district_repo.get_by_id(id).await?;

        let mut active: district::ActiveModel = district.into();
        active.status = Set(new_status.clone());
        let updated = self.district_repo.update(active).await?;

        if new_status == DistrictStatus::Inactive {
            self.account_service
                .cascade_block_agents_for_district(id)
                .await?;
        }

        tracing::info!(district_id = id, status = %new_status.to_value(), "District status updated");
        Ok(updated)
    }
}

/// Validate that a string is a GeoJSON Polygon with a closed outer ring.
///
/// The outer ring needs at least 4 distinct vertices plus the closing
/// position, and its first and last positions must match.
fn validate_polygon(geo: &str) -> AppResult<()> {
    if geo.is_empty() {
        return Err(AppError::InvalidInput("GeoJSON string is required".to_string()));
    }

    let value: serde_json::Value = serde_json::from_str(geo)
        .map_err(|e| AppError::InvalidInput(format!("Invalid GeoJSON: {e}")))?;

    if value.get("type").and_then(serde_json::Value::as_str) != Some("Polygon") {
        return Err(AppError::InvalidInput(
            "Invalid GeoJSON: type must be 'Polygon'".to_string(),
        ));
    }

    let rings = value
        .get("coordinates")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| {
            AppError::InvalidInput("Invalid GeoJSON: coordinates must be a list".to_string())
        })?;

    let ring = rings
        .first()
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| {
            AppError::InvalidInput("Invalid GeoJSON: missing outer ring".to_string())
        })?;

    let positions = ring
        .iter()
        .map(position_of)
        .collect::<AppResult<Vec<(f64, f64)>>>()?;

    let (Some(first), Some(last)) = (positions.first(), positions.last()) else {
        return Err(AppError::InvalidInput(
            "Invalid GeoJSON: outer ring is empty".to_string(),
        ));
    };

    if first != last {
        return Err(AppError::InvalidInput(
            "Invalid GeoJSON: Polygon must be closed (first and last points must match)"
                .to_string(),
        ));
    }

    // Distinct vertices, closing position excluded.
    let mut distinct: Vec<(f64, f64)> = Vec::new();
    for position in &positions[..positions.len() - 1] {
        if !distinct.contains(position) {
            distinct.push(*position);
        }
    }

    if distinct.len() < 4 {
        return Err(AppError::InvalidInput(
            "Invalid GeoJSON: Polygon must have at least 4 points (including closing point)"
                .to_string(),
        ));
    }

    Ok(())
}

/// Extract an `[x, y]` position from a ring element.
fn position_of(value: &serde_json::Value) -> AppResult<(f64, f64)> {
    let pair = value.as_array().ok_or_else(|| {
        AppError::InvalidInput("Invalid GeoJSON: ring positions must be coordinate pairs".to_string())
    })?;

    match (
        pair.first().and_then(serde_json::Value::as_f64),
        pair.get(1).and_then(serde_json::Value::as_f64),
    ) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(AppError::InvalidInput(
            "Invalid GeoJSON: ring positions must be numeric [x, y] pairs".to_string(),
        )),
    }
}

/// Validate that a centroid is a two-element numeric coordinate pair.
fn validate_centroid(centroid: &serde_json::Value) -> AppResult<()> {
    let pair = centroid.as_array().ok_or_else(|| {
        AppError::InvalidInput("Centroid must be a two-element coordinate pair".to_string())
    })?;

    if pair.len() != 2 || !pair.iter().all(|v| v.as_f64().is_some()) {
        return Err(AppError::InvalidInput(
            "Centroid must be a two-element coordinate pair".to_string(),
        ));
    }

    Ok(())
}
