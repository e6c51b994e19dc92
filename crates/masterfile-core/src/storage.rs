use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row, Sqlite};

use crate::hotel::HotelRecord;
use crate::identity::IdentityKey;
use crate::matching::normalize_name;
use crate::source::fields::parse_timestamp;
use crate::transfer::CellValue;
use crate::{Error, Result};

pub const HOTEL_TABLE: &str = "hotel_masterfile";

const INIT_SQL: &str = r"
CREATE TABLE IF NOT EXISTS hotel_masterfile (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    hotel_code TEXT NOT NULL UNIQUE,
    chain_code TEXT,
    chain TEXT,
    name TEXT NOT NULL,
    state_code TEXT,
    state TEXT,
    country_code TEXT,
    country TEXT,
    city TEXT,
    postal_code TEXT,
    address_line_1 TEXT,
    address_line_2 TEXT,
    full_address TEXT,
    latitude REAL,
    longitude REAL,
    primary_airport_code TEXT,
    description TEXT,
    phone_number TEXT,
    fax_number TEXT,
    sabre_rating REAL,
    links TEXT,
    parking TEXT,
    is_pet_friendly BOOLEAN,
    pet_policy TEXT,
    pet_fee_night REAL,
    pet_fee_total_max REAL,
    pet_fee_deposit REAL,
    pet_fee_currency TEXT,
    pet_fee_interval TEXT,
    pet_fee_variations TEXT,
    has_pet_deposit BOOLEAN,
    is_deposit_refundable BOOLEAN,
    allowed_pet_types TEXT,
    weight_limit TEXT,
    max_pets INTEGER,
    has_pet_friendly_rooms BOOLEAN,
    pet_amenities TEXT,
    nearby_parks TEXT,
    source TEXT,
    last_updated TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_hotels_chain ON hotel_masterfile(chain_code);
CREATE INDEX IF NOT EXISTS idx_hotels_country ON hotel_masterfile(country_code);
";

/// Every masterfile column except the surrogate `id`, in bind order.
const HOTEL_COLUMNS: &[&str] = &[
    "hotel_code",
    "chain_code",
    "chain",
    "name",
    "state_code",
    "state",
    "country_code",
    "country",
    "city",
    "postal_code",
    "address_line_1",
    "address_line_2",
    "full_address",
    "latitude",
    "longitude",
    "primary_airport_code",
    "description",
    "phone_number",
    "fax_number",
    "sabre_rating",
    "links",
    "parking",
    "is_pet_friendly",
    "pet_policy",
    "pet_fee_night",
    "pet_fee_total_max",
    "pet_fee_deposit",
    "pet_fee_currency",
    "pet_fee_interval",
    "pet_fee_variations",
    "has_pet_deposit",
    "is_deposit_refundable",
    "allowed_pet_types",
    "weight_limit",
    "max_pets",
    "has_pet_friendly_rooms",
    "pet_amenities",
    "nearby_parks",
    "source",
    "last_updated",
];

static SELECT_HOTEL_SQL: LazyLock<String> = LazyLock::new(|| {
    format!("SELECT {} FROM hotel_masterfile", HOTEL_COLUMNS.join(", "))
});

static UPSERT_HOTEL_SQL: LazyLock<String> = LazyLock::new(|| {
    let placeholders = vec!["?"; HOTEL_COLUMNS.len()].join(", ");
    let updates = HOTEL_COLUMNS
        .iter()
        .skip(1)
        .map(|c| format!("{c} = excluded.{c}"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "INSERT INTO hotel_masterfile ({}) VALUES ({placeholders}) \
         ON CONFLICT(hotel_code) DO UPDATE SET {updates}",
        HOTEL_COLUMNS.join(", ")
    )
});

/// Timestamps are stored in one fixed-width UTC form so that text ordering
/// matches time ordering.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
    pub not_null: bool,
}

pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn open(path: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&format!("sqlite:{path}?mode=rwc"))
            .await?;

        sqlx::query(INIT_SQL).execute(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn open_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        sqlx::query(INIT_SQL).execute(&pool).await?;

        Ok(Self { pool })
    }

    // Hotel operations

    pub async fn upsert_hotel(&self, hotel: &HotelRecord) -> Result<()> {
        bind_hotel(sqlx::query(UPSERT_HOTEL_SQL.as_str()), hotel)?
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Upserts every row in one transaction.
    pub async fn upsert_hotels(&self, hotels: &[HotelRecord]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;

        for hotel in hotels {
            bind_hotel(sqlx::query(UPSERT_HOTEL_SQL.as_str()), hotel)?
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        tracing::debug!(count = hotels.len(), "Upserted hotels");

        Ok(hotels.len())
    }

    pub async fn get_hotel(&self, hotel_code: &str) -> Result<HotelRecord> {
        let row = sqlx::query(&format!("{} WHERE hotel_code = ?", SELECT_HOTEL_SQL.as_str()))
            .bind(hotel_code)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::HotelNotFound(hotel_code.to_string()))?;

        parse_hotel_row(&row)
    }

    pub async fn list_hotels(&self, chain_code: Option<&str>) -> Result<Vec<HotelRecord>> {
        let rows = match chain_code {
            Some(chain) => {
                sqlx::query(&format!(
                    "{} WHERE chain_code = ? ORDER BY id",
                    SELECT_HOTEL_SQL.as_str()
                ))
                .bind(chain)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(&format!("{} ORDER BY id", SELECT_HOTEL_SQL.as_str()))
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        rows.iter().map(parse_hotel_row).collect()
    }

    pub async fn hotel_codes(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT hotel_code FROM hotel_masterfile")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(code,)| code).collect())
    }

    /// Code of a stored row of the same chain and locality whose name
    /// normalizes to the same text.
    pub async fn find_hotel_code(&self, key: &IdentityKey) -> Result<Option<String>> {
        let Some(wanted) = key.normalized_name() else {
            return Ok(None);
        };

        let rows: Vec<(String, String)> = sqlx::query_as(
            r"
            SELECT hotel_code, name FROM hotel_masterfile
            WHERE chain_code = ? AND city IS ? AND state IS ? AND country IS ?
            ORDER BY id
            ",
        )
        .bind(&key.chain_code)
        .bind(key.city.as_deref())
        .bind(key.state.as_deref())
        .bind(key.country.as_deref())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .find(|(_, name)| normalize_name(name).as_deref() == Some(wanted.as_str()))
            .map(|(code, _)| code))
    }

    pub async fn last_updated_for_chain(&self, chain_code: &str) -> Result<Option<DateTime<Utc>>> {
        let (latest,): (Option<String>,) =
            sqlx::query_as("SELECT MAX(last_updated) FROM hotel_masterfile WHERE chain_code = ?")
                .bind(chain_code)
                .fetch_one(&self.pool)
                .await?;

        Ok(parse_timestamp(latest.as_deref()))
    }

    /// Returns whether a row with that code existed.
    pub async fn update_pet_policy(&self, hotel_code: &str, pet_policy: &str) -> Result<bool> {
        let result =
            sqlx::query("UPDATE hotel_masterfile SET pet_policy = ? WHERE TRIM(hotel_code) = ?")
                .bind(pet_policy)
                .bind(hotel_code.trim())
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    // Generic table access

    pub async fn table_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        let rows = sqlx::query(&format!("PRAGMA table_info({})", identifier(table)?))
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(ColumnInfo {
                    name: row.try_get("name")?,
                    declared_type: row.try_get("type")?,
                    not_null: row.try_get::<i64, _>("notnull")? != 0,
                })
            })
            .collect()
    }

    /// Every row of `columns`, each value cast to text.
    pub async fn fetch_text_rows(
        &self,
        table: &str,
        columns: &[String],
    ) -> Result<Vec<Vec<Option<String>>>> {
        let casts = columns
            .iter()
            .map(|c| identifier(c).map(|c| format!("CAST({c} AS TEXT)")))
            .collect::<Result<Vec<_>>>()?
            .join(", ");

        let rows = sqlx::query(&format!("SELECT {casts} FROM {}", identifier(table)?))
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                (0..columns.len())
                    .map(|i| row.try_get::<Option<String>, _>(i).map_err(Error::from))
                    .collect()
            })
            .collect()
    }

    /// Empties `table` and inserts `rows`. Nothing changes unless every insert
    /// succeeds.
    pub async fn replace_rows(
        &self,
        table: &str,
        columns: &[String],
        rows: &[Vec<CellValue>],
    ) -> Result<usize> {
        let table = identifier(table)?;
        let column_list = columns
            .iter()
            .map(|c| identifier(c))
            .collect::<Result<Vec<_>>>()?
            .join(", ");
        let placeholders = vec!["?"; columns.len()].join(", ");
        let insert = format!("INSERT INTO {table} ({column_list}) VALUES ({placeholders})");

        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&mut *tx)
            .await?;

        for row in rows {
            let mut query = sqlx::query(&insert);
            for cell in row {
                query = match cell {
                    CellValue::Null => query.bind(None::<String>),
                    CellValue::Text(s) => query.bind(s.clone()),
                    CellValue::Integer(n) => query.bind(*n),
                    CellValue::Real(f) => query.bind(*f),
                    CellValue::Bool(b) => query.bind(*b),
                };
            }
            query.execute(&mut *tx).await?;
        }

        tx.commit().await?;
        Ok(rows.len())
    }
}

fn identifier(name: &str) -> Result<&str> {
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid {
        Ok(name)
    } else {
        Err(Error::InvalidIdentifier(name.to_string()))
    }
}

fn json_text(value: Option<&serde_json::Value>) -> Result<Option<String>> {
    Ok(value.map(serde_json::to_string).transpose()?)
}

fn decimal(value: Option<Decimal>) -> Option<f64> {
    value.and_then(|d| d.to_f64())
}

fn bind_hotel<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    h: &HotelRecord,
) -> Result<Query<'q, Sqlite, SqliteArguments<'q>>> {
    Ok(query
        .bind(h.hotel_code.clone())
        .bind(h.chain_code.clone())
        .bind(h.chain.clone())
        .bind(h.name.clone())
        .bind(h.state_code.clone())
        .bind(h.state.clone())
        .bind(h.country_code.clone())
        .bind(h.country.clone())
        .bind(h.city.clone())
        .bind(h.postal_code.clone())
        .bind(h.address_line_1.clone())
        .bind(h.address_line_2.clone())
        .bind(h.full_address.clone())
        .bind(h.latitude)
        .bind(h.longitude)
        .bind(h.primary_airport_code.clone())
        .bind(h.description.clone())
        .bind(h.phone_number.clone())
        .bind(h.fax_number.clone())
        .bind(h.sabre_rating)
        .bind(json_text(h.links.as_ref())?)
        .bind(json_text(h.parking.as_ref())?)
        .bind(h.is_pet_friendly)
        .bind(h.pet_policy.clone())
        .bind(decimal(h.pet_fee_night))
        .bind(decimal(h.pet_fee_total_max))
        .bind(decimal(h.pet_fee_deposit))
        .bind(h.pet_fee_currency.map(|c| c.as_str()))
        .bind(h.pet_fee_interval.map(|i| i.as_str()))
        .bind(json_text(h.pet_fee_variations.as_ref())?)
        .bind(h.has_pet_deposit)
        .bind(h.is_deposit_refundable)
        .bind(h.allowed_pet_types.clone())
        .bind(h.weight_limit.clone())
        .bind(h.max_pets.map(i64::from))
        .bind(h.has_pet_friendly_rooms)
        .bind(json_text(h.pet_amenities.as_ref())?)
        .bind(json_text(h.nearby_parks.as_ref())?)
        .bind(h.source.clone())
        .bind(h.last_updated.as_ref().map(format_timestamp)))
}

fn get_json(row: &SqliteRow, column: &str) -> Result<Option<serde_json::Value>> {
    let text: Option<String> = row.try_get(column)?;
    Ok(text.map(|t| serde_json::from_str(&t)).transpose()?)
}

fn get_decimal(row: &SqliteRow, column: &str) -> Result<Option<Decimal>> {
    let value: Option<f64> = row.try_get(column)?;
    Ok(value.and_then(|v| Decimal::try_from(v).ok()))
}

fn parse_hotel_row(row: &SqliteRow) -> Result<HotelRecord> {
    let currency: Option<String> = row.try_get("pet_fee_currency")?;
    let interval: Option<String> = row.try_get("pet_fee_interval")?;
    let max_pets: Option<i64> = row.try_get("max_pets")?;
    let last_updated: Option<String> = row.try_get("last_updated")?;

    Ok(HotelRecord {
        hotel_code: row.try_get("hotel_code")?,
        chain_code: row.try_get("chain_code")?,
        chain: row.try_get("chain")?,
        name: row.try_get("name")?,
        state_code: row.try_get("state_code")?,
        state: row.try_get("state")?,
        country_code: row.try_get("country_code")?,
        country: row.try_get("country")?,
        city: row.try_get("city")?,
        postal_code: row.try_get("postal_code")?,
        address_line_1: row.try_get("address_line_1")?,
        address_line_2: row.try_get("address_line_2")?,
        full_address: row.try_get("full_address")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        primary_airport_code: row.try_get("primary_airport_code")?,
        description: row.try_get("description")?,
        phone_number: row.try_get("phone_number")?,
        fax_number: row.try_get("fax_number")?,
        sabre_rating: row.try_get("sabre_rating")?,
        links: get_json(row, "links")?,
        parking: get_json(row, "parking")?,
        is_pet_friendly: row.try_get("is_pet_friendly")?,
        pet_policy: row.try_get("pet_policy")?,
        pet_fee_night: get_decimal(row, "pet_fee_night")?,
        pet_fee_total_max: get_decimal(row, "pet_fee_total_max")?,
        pet_fee_deposit: get_decimal(row, "pet_fee_deposit")?,
        pet_fee_currency: currency.map(|c| c.parse()).transpose()?,
        pet_fee_interval: interval.map(|i| i.parse()).transpose()?,
        pet_fee_variations: get_json(row, "pet_fee_variations")?,
        has_pet_deposit: row.try_get("has_pet_deposit")?,
        is_deposit_refundable: row.try_get("is_deposit_refundable")?,
        allowed_pet_types: row.try_get("allowed_pet_types")?,
        weight_limit: row.try_get("weight_limit")?,
        max_pets: max_pets.and_then(|n| u32::try_from(n).ok()),
        has_pet_friendly_rooms: row.try_get("has_pet_friendly_rooms")?,
        pet_amenities: get_json(row, "pet_amenities")?,
        nearby_parks: get_json(row, "nearby_parks")?,
        source: row.try_get("source")?,
        last_updated: parse_timestamp(last_updated.as_deref()),
    })
}
