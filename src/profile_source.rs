use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::seq::SliceRandom;
use tokio::sync::OnceCell;

use crate::configuration::DataSourceSettings;
use crate::domain::{CardRecord, CustomerProfile, ProfileRow, non_blank};
use crate::synthetic_data::SyntheticDataProvider;
use crate::telemetry::{error_chain_fmt, spawn_blocking_with_tracing};

/// Failure to read the card list or the profile dataset.
///
/// Clonable so that a card list failure captured at startup can be
/// reported again by every run that needs a card.
#[derive(thiserror::Error, Clone)]
pub enum DataSourceError {
    #[error("Failed to read the card list at {}", .path.display())]
    CardsUnreadable {
        path: PathBuf,
        #[source]
        source: Arc<std::io::Error>,
    },
    #[error("Failed to parse the card list at {}", .path.display())]
    CardsMalformed {
        path: PathBuf,
        #[source]
        source: Arc<serde_json::Error>,
    },
    #[error("The card list at {} is empty", .path.display())]
    NoCards { path: PathBuf },
    #[error("Failed to load customer profiles from {}", .path.display())]
    ProfilesUnreadable {
        path: PathBuf,
        #[source]
        source: Arc<csv::Error>,
    },
    #[error("Loading customer profiles was interrupted: {0}")]
    ProfilesLoadInterrupted(String),
}

impl std::fmt::Debug for DataSourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Supplies test cards and customer profiles to the payment pipeline.
///
/// The card list is read once at construction. A failure there does not
/// prevent the service from starting; it is returned by [`Self::cards`]
/// instead. The profile dataset is loaded on first use and cached for the
/// lifetime of the process.
pub struct CustomerProfileSource {
    cards: Result<Vec<CardRecord>, DataSourceError>,
    dataset_path: Option<PathBuf>,
    dataset: OnceCell<Vec<ProfileRow>>,
    synthetic: Arc<SyntheticDataProvider>,
}

impl CustomerProfileSource {
    pub fn new(settings: &DataSourceSettings, synthetic: Arc<SyntheticDataProvider>) -> Self {
        let cards = load_cards(&settings.cards_path);
        match &cards {
            Ok(cards) => tracing::info!(
                path = %settings.cards_path.display(),
                count = cards.len(),
                "Loaded test cards"
            ),
            Err(e) => tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "Test cards are unavailable. Every run will fail until this is fixed"
            ),
        }
        Self {
            cards,
            dataset_path: settings.csv_path.clone(),
            dataset: OnceCell::new(),
            synthetic,
        }
    }

    pub fn cards(&self) -> Result<&[CardRecord], DataSourceError> {
        self.cards.as_deref().map_err(Clone::clone)
    }

    /// Load the profile dataset if it has not been loaded yet.
    ///
    /// Concurrent first callers share a single load. A failed load is not
    /// cached and will be attempted again by the next caller. Returns `None`
    /// when no dataset is configured.
    pub async fn load(&self) -> Result<Option<&[ProfileRow]>, DataSourceError> {
        let Some(path) = &self.dataset_path else {
            return Ok(None);
        };
        let rows = self
            .dataset
            .get_or_try_init(|| async {
                tracing::info!(path = %path.display(), "Loading customer profiles");
                let owned_path = path.clone();
                let rows = spawn_blocking_with_tracing(move || read_profiles(&owned_path))
                    .await
                    .map_err(|e| DataSourceError::ProfilesLoadInterrupted(e.to_string()))?
                    .inspect_err(|e| {
                        tracing::error!(
                            error.cause_chain = ?e,
                            error.message = %e,
                            "Failed to load customer profiles"
                        )
                    })?;
                tracing::info!(rows = rows.len(), "Loaded customer profiles");
                Ok::<_, DataSourceError>(rows)
            })
            .await?;
        Ok(Some(rows.as_slice()))
    }

    /// A customer drawn uniformly from the dataset, with blank fields filled
    /// in by the synthetic data provider.
    #[tracing::instrument(name = "Sampling customer profile", skip(self))]
    pub async fn sample(&self) -> Result<CustomerProfile, DataSourceError> {
        let rows = self.load().await?;
        let row = rows.and_then(|rows| rows.choose(&mut rand::thread_rng()));
        if row.is_none() {
            tracing::debug!("No profile row available, using a fully synthetic customer");
        }
        Ok(self.complete(row.unwrap_or(&ProfileRow::default())))
    }

    /// Turn a (possibly sparse) row into a complete customer profile.
    pub fn complete(&self, row: &ProfileRow) -> CustomerProfile {
        let synthetic = &self.synthetic;
        CustomerProfile {
            client_user_id: synthetic.uuid(),
            first_name: non_blank(&row.first_name).unwrap_or_else(|| synthetic.first_name()),
            last_name: non_blank(&row.last_name).unwrap_or_else(|| synthetic.last_name()),
            email: non_blank(&row.email).unwrap_or_else(|| synthetic.email()),
            phone: synthetic.phone_number(),
            address: non_blank(&row.address).unwrap_or_else(|| synthetic.street_address()),
            city: non_blank(&row.city).unwrap_or_else(|| synthetic.city()),
            state: non_blank(&row.state).unwrap_or_else(|| synthetic.state()),
            country: synthetic.country_code(),
            postal_code: non_blank(&row.postal_code).unwrap_or_else(|| synthetic.postal_code()),
        }
    }
}

fn load_cards(path: &Path) -> Result<Vec<CardRecord>, DataSourceError> {
    let raw = std::fs::read_to_string(path).map_err(|e| DataSourceError::CardsUnreadable {
        path: path.to_path_buf(),
        source: Arc::new(e),
    })?;
    let cards: Vec<CardRecord> =
        serde_json::from_str(&raw).map_err(|e| DataSourceError::CardsMalformed {
            path: path.to_path_buf(),
            source: Arc::new(e),
        })?;
    if cards.is_empty() {
        return Err(DataSourceError::NoCards {
            path: path.to_path_buf(),
        });
    }
    Ok(cards)
}

fn read_profiles(path: &Path) -> Result<Vec<ProfileRow>, DataSourceError> {
    let to_error = |e: csv::Error| DataSourceError::ProfilesUnreadable {
        path: path.to_path_buf(),
        source: Arc::new(e),
    };
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .map_err(to_error)?;
    reader
        .into_deserialize()
        .collect::<Result<Vec<ProfileRow>, csv::Error>>()
        .map_err(to_error)
}
