//! Parcel tracking use-case service.
//!
//! # Responsibility
//! - Register parcels and walk them through their lifecycle.
//! - Guard address edits and deletion behind the `registered` status.
//!
//! # Invariants
//! - Status only moves forward: `registered -> sent -> delivered`.
//! - Address changes and deletes are rejected once a parcel left `registered`.
//! - Each operation reads then writes without a transaction; concurrent
//!   writers resolve as last-write-wins.

use crate::model::parcel::{ClientId, Parcel, ParcelNumber, ParcelStatus};
use crate::repo::parcel_repo::{ParcelRepository, RepoError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from parcel service operations.
#[derive(Debug)]
pub enum ParcelServiceError {
    /// No parcel with the requested number.
    ParcelNotFound(ParcelNumber),
    /// Operation is only allowed while the parcel is `registered`.
    NotRegistered {
        number: ParcelNumber,
        status: ParcelStatus,
    },
    /// Parcel is already delivered; there is no next status.
    FinalStatus(ParcelNumber),
    /// Address is empty after trim.
    BlankAddress,
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for ParcelServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParcelNotFound(number) => write!(f, "parcel not found: {number}"),
            Self::NotRegistered { number, status } => write!(
                f,
                "parcel {number} is `{status}`; only registered parcels can be changed"
            ),
            Self::FinalStatus(number) => {
                write!(f, "parcel {number} is already delivered")
            }
            Self::BlankAddress => write!(f, "address must not be blank"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ParcelServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ParcelServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(number) => Self::ParcelNotFound(number),
            other => Self::Repo(other),
        }
    }
}

pub type ParcelServiceResult<T> = Result<T, ParcelServiceError>;

/// Parcel tracking facade.
pub struct ParcelService<R: ParcelRepository> {
    repo: R,
}

impl<R: ParcelRepository> ParcelService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a new parcel for `client` and returns it with its number.
    pub fn register(
        &self,
        client: ClientId,
        address: impl Into<String>,
    ) -> ParcelServiceResult<Parcel> {
        let address = normalize_address(address.into())?;
        let mut parcel = Parcel::new(client, address);
        parcel.number = self.repo.add(&parcel)?;

        info!(
            "event=parcel_register module=service status=ok number={} client={client}",
            parcel.number
        );
        Ok(parcel)
    }

    /// Loads one parcel.
    pub fn parcel(&self, number: ParcelNumber) -> ParcelServiceResult<Parcel> {
        Ok(self.repo.get(number)?)
    }

    /// Lists all parcels of a client.
    pub fn client_parcels(&self, client: ClientId) -> ParcelServiceResult<Vec<Parcel>> {
        Ok(self.repo.get_by_client(client)?)
    }

    /// Advances the parcel to its next status and returns the new status.
    pub fn next_status(&self, number: ParcelNumber) -> ParcelServiceResult<ParcelStatus> {
        let parcel = self.repo.get(number)?;
        let Some(next) = parcel.status.next() else {
            warn!("event=parcel_next_status module=service status=rejected number={number} reason=delivered");
            return Err(ParcelServiceError::FinalStatus(number));
        };

        ensure_changed(number, self.repo.set_status(number, next)?)?;
        info!(
            "event=parcel_next_status module=service status=ok number={number} from={} to={next}",
            parcel.status
        );
        Ok(next)
    }

    /// Replaces the address of a `registered` parcel.
    pub fn change_address(
        &self,
        number: ParcelNumber,
        address: impl Into<String>,
    ) -> ParcelServiceResult<()> {
        let address = normalize_address(address.into())?;
        self.ensure_registered(number)?;

        ensure_changed(number, self.repo.set_address(number, &address)?)?;
        info!("event=parcel_change_address module=service status=ok number={number}");
        Ok(())
    }

    /// Deletes a `registered` parcel.
    pub fn delete(&self, number: ParcelNumber) -> ParcelServiceResult<()> {
        self.ensure_registered(number)?;

        ensure_changed(number, self.repo.delete(number)?)?;
        info!("event=parcel_delete module=service status=ok number={number}");
        Ok(())
    }

    fn ensure_registered(&self, number: ParcelNumber) -> ParcelServiceResult<()> {
        let parcel = self.repo.get(number)?;
        if !parcel.is_registered() {
            warn!(
                "event=parcel_guard module=service status=rejected number={number} parcel_status={}",
                parcel.status
            );
            return Err(ParcelServiceError::NotRegistered {
                number,
                status: parcel.status,
            });
        }
        Ok(())
    }
}

// The row can vanish between the read and the write.
fn ensure_changed(number: ParcelNumber, changed: usize) -> ParcelServiceResult<()> {
    if changed == 0 {
        return Err(ParcelServiceError::ParcelNotFound(number));
    }
    Ok(())
}

fn normalize_address(address: String) -> ParcelServiceResult<String> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(ParcelServiceError::BlankAddress);
    }
    if trimmed.len() == address.len() {
        return Ok(address);
    }
    Ok(trimmed.to_string())
}
