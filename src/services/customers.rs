//! Customer identity resolution by phone suffix.
//!
//! Re-authentication and order-lookup flows know a wholesaler and the last
//! four digits of a phone number. Candidates are gathered through every
//! relationship path a tenant has accumulated, then disambiguated by a ranked
//! strategy chain. The resolver is total: ambiguity never errors, the chain
//! always produces a winner once at least one candidate matches.

use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::entities::{
    customer::{self, Entity as CustomerEntity},
    customer_group::{self, Entity as CustomerGroupEntity},
    customer_group_member::{self, Entity as GroupMemberEntity},
    order::{self, Entity as OrderEntity},
    wholesaler::Entity as WholesalerEntity,
    wholesaler_customer::{self, Entity as WholesalerCustomerEntity, STATUS_ACTIVE},
};
use crate::errors::ServiceError;

static NON_DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\D").expect("valid regex"));

/// Strips everything but digits: `"+44 7911-123456"` -> `"447911123456"`.
pub fn normalize_phone(raw: &str) -> String {
    NON_DIGITS.replace_all(raw, "").into_owned()
}

/// Canonical international rendering used for exact comparison: digits with a
/// single leading `+`, the `00` international prefix collapsed.
pub fn international_form(raw: &str) -> String {
    let digits = normalize_phone(raw);
    let digits = digits.strip_prefix("00").unwrap_or(&digits);
    format!("+{}", digits)
}

/// Whether an email address counts toward a candidate's identity score.
/// Wholesaler-owned and internal/test addresses are excluded; these rules are
/// brittle business policy, kept in one place on purpose.
pub fn is_usable_email(email: Option<&str>, wholesaler_contact: Option<&str>) -> bool {
    let email = match email {
        Some(e) if !e.trim().is_empty() => e.trim().to_ascii_lowercase(),
        _ => return false,
    };

    let (local, domain) = match email.split_once('@') {
        Some((l, d)) if !l.is_empty() && !d.is_empty() => (l, d),
        _ => return false,
    };

    if local.starts_with("test")
        || local.contains("+test")
        || local.starts_with("noreply")
        || local.starts_with("no-reply")
        || email.contains("placeholder")
    {
        return false;
    }
    if matches!(domain, "example.com" | "test.com" | "example.org") {
        return false;
    }

    if let Some(contact) = wholesaler_contact {
        let contact = contact.trim().to_ascii_lowercase();
        if email == contact {
            return false;
        }
        if let Some((_, contact_domain)) = contact.split_once('@') {
            if domain == contact_domain {
                return false;
            }
        }
    }

    true
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ResolveQuery {
    pub wholesaler_id: Uuid,
    /// Last four digits of the phone number being matched.
    pub last_four: String,
    /// Full number when the calling flow knows it; enables the exact-match
    /// strategy.
    pub full_phone: Option<String>,
}

/// A gathered candidate with the facts the strategies rank on.
#[derive(Debug, Clone)]
pub struct CandidateProfile {
    pub customer: customer::Model,
    pub normalized_phone: String,
    pub prior_orders: u64,
    pub usable_email: bool,
}

impl CandidateProfile {
    /// Engagement score: order history dominates, a usable email breaks even
    /// histories apart.
    pub fn score(&self) -> u64 {
        self.prior_orders * 2 + u64::from(self.usable_email)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResolvedCustomer {
    pub customer_id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub prior_orders: u64,
    /// Which strategy produced the winner (for diagnostics, not contract).
    pub matched_by: String,
}

/// One step of the disambiguation chain. Returning `None` passes the decision
/// to the next strategy; the final strategy always picks.
pub trait DisambiguationStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn pick<'a>(
        &self,
        query: &ResolveQuery,
        candidates: &'a [CandidateProfile],
    ) -> Option<&'a CandidateProfile>;
}

/// (a) Exact match of the normalized international form, when the caller
/// supplied a full number.
pub struct ExactInternationalMatch;

impl DisambiguationStrategy for ExactInternationalMatch {
    fn name(&self) -> &'static str {
        "exact_international_match"
    }

    fn pick<'a>(
        &self,
        query: &ResolveQuery,
        candidates: &'a [CandidateProfile],
    ) -> Option<&'a CandidateProfile> {
        let full = query.full_phone.as_deref()?;
        let target = international_form(full);
        let matches: Vec<&CandidateProfile> = candidates
            .iter()
            .filter(|c| {
                c.customer
                    .phone
                    .as_deref()
                    .map(international_form)
                    .as_deref()
                    == Some(target.as_str())
            })
            .collect();
        match matches.as_slice() {
            [single] => Some(single),
            _ => None,
        }
    }
}

/// (b) Highest engagement score; ties fall through.
pub struct HighestEngagementScore;

impl DisambiguationStrategy for HighestEngagementScore {
    fn name(&self) -> &'static str {
        "highest_engagement_score"
    }

    fn pick<'a>(
        &self,
        _query: &ResolveQuery,
        candidates: &'a [CandidateProfile],
    ) -> Option<&'a CandidateProfile> {
        let best = candidates.iter().map(CandidateProfile::score).max()?;
        let mut winners = candidates.iter().filter(|c| c.score() == best);
        let first = winners.next()?;
        if winners.next().is_some() {
            return None;
        }
        Some(first)
    }
}

/// (c) First candidate with a usable email address.
pub struct FirstUsableEmail;

impl DisambiguationStrategy for FirstUsableEmail {
    fn name(&self) -> &'static str {
        "first_usable_email"
    }

    fn pick<'a>(
        &self,
        _query: &ResolveQuery,
        candidates: &'a [CandidateProfile],
    ) -> Option<&'a CandidateProfile> {
        candidates.iter().find(|c| c.usable_email)
    }
}

/// (d) First candidate found. Terminal: always picks.
pub struct FirstCandidate;

impl DisambiguationStrategy for FirstCandidate {
    fn name(&self) -> &'static str {
        "first_candidate"
    }

    fn pick<'a>(
        &self,
        _query: &ResolveQuery,
        candidates: &'a [CandidateProfile],
    ) -> Option<&'a CandidateProfile> {
        candidates.first()
    }
}

/// Runs the chain; total as long as `candidates` is non-empty and the chain
/// ends with a terminal strategy.
pub fn disambiguate<'a>(
    strategies: &[Box<dyn DisambiguationStrategy>],
    query: &ResolveQuery,
    candidates: &'a [CandidateProfile],
) -> Option<(&'a CandidateProfile, &'static str)> {
    for strategy in strategies {
        if let Some(winner) = strategy.pick(query, candidates) {
            return Some((winner, strategy.name()));
        }
    }
    None
}

/// The single capability query answering "is X a customer of wholesaler Y",
/// consulting all three coexisting relationship mechanisms: active
/// relationship records, the legacy direct foreign key, and customer-group
/// membership.
#[derive(Clone)]
pub struct CustomerAccessAdapter {
    db_pool: Arc<DbPool>,
}

impl CustomerAccessAdapter {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Every customer connected to the wholesaler, in stable creation order.
    pub async fn customers_of(
        &self,
        wholesaler_id: Uuid,
    ) -> Result<Vec<customer::Model>, ServiceError> {
        let db = self.db_pool.as_ref();
        let mut ids: HashSet<Uuid> = HashSet::new();

        let links = WholesalerCustomerEntity::find()
            .filter(wholesaler_customer::Column::WholesalerId.eq(wholesaler_id))
            .filter(wholesaler_customer::Column::Status.eq(STATUS_ACTIVE))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        ids.extend(links.into_iter().map(|l| l.customer_id));

        let legacy = CustomerEntity::find()
            .filter(customer::Column::WholesalerId.eq(wholesaler_id))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        ids.extend(legacy.into_iter().map(|c| c.id));

        let groups = CustomerGroupEntity::find()
            .filter(customer_group::Column::WholesalerId.eq(wholesaler_id))
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)?;
        if !groups.is_empty() {
            let group_ids: Vec<Uuid> = groups.into_iter().map(|g| g.id).collect();
            let members = GroupMemberEntity::find()
                .filter(customer_group_member::Column::GroupId.is_in(group_ids))
                .all(db)
                .await
                .map_err(ServiceError::DatabaseError)?;
            ids.extend(members.into_iter().map(|m| m.customer_id));
        }

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // Stable "first found" ordering for the terminal strategy.
        CustomerEntity::find()
            .filter(customer::Column::Id.is_in(ids.into_iter().collect::<Vec<_>>()))
            .order_by_asc(customer::Column::CreatedAt)
            .order_by_asc(customer::Column::Id)
            .all(db)
            .await
            .map_err(ServiceError::DatabaseError)
    }

    /// Membership check used by order-authorization call sites.
    pub async fn is_customer(
        &self,
        wholesaler_id: Uuid,
        customer_id: Uuid,
    ) -> Result<bool, ServiceError> {
        let customers = self.customers_of(wholesaler_id).await?;
        Ok(customers.iter().any(|c| c.id == customer_id))
    }
}

/// Resolves a phone-suffix query to at most one customer.
pub struct CustomerResolver {
    db_pool: Arc<DbPool>,
    access: CustomerAccessAdapter,
    strategies: Vec<Box<dyn DisambiguationStrategy>>,
}

impl CustomerResolver {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        let access = CustomerAccessAdapter::new(db_pool.clone());
        Self {
            db_pool,
            access,
            strategies: Self::default_strategies(),
        }
    }

    /// The ranked chain. Swappable so a stronger identity proof (OTP,
    /// explicit account linking) can replace the heuristics without touching
    /// order logic.
    pub fn default_strategies() -> Vec<Box<dyn DisambiguationStrategy>> {
        vec![
            Box::new(ExactInternationalMatch),
            Box::new(HighestEngagementScore),
            Box::new(FirstUsableEmail),
            Box::new(FirstCandidate),
        ]
    }

    pub fn with_strategies(mut self, strategies: Vec<Box<dyn DisambiguationStrategy>>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn access(&self) -> &CustomerAccessAdapter {
        &self.access
    }

    /// Deterministic and total: identical inputs against unchanged data
    /// always return the same candidate, and ambiguity never errors.
    #[instrument(skip(self, query), fields(wholesaler_id = %query.wholesaler_id, last_four = %query.last_four))]
    pub async fn resolve(
        &self,
        query: ResolveQuery,
    ) -> Result<Option<ResolvedCustomer>, ServiceError> {
        if query.last_four.len() != 4 || !query.last_four.chars().all(|c| c.is_ascii_digit()) {
            return Err(ServiceError::ValidationError(
                "last_four must be exactly four digits".to_string(),
            ));
        }

        let db = self.db_pool.as_ref();
        let wholesaler = WholesalerEntity::find_by_id(query.wholesaler_id)
            .one(db)
            .await
            .map_err(ServiceError::DatabaseError)?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Wholesaler {} not found", query.wholesaler_id))
            })?;

        let connected = self.access.customers_of(query.wholesaler_id).await?;

        let mut profiles = Vec::new();
        for candidate in connected {
            let phone = match candidate.phone.as_deref() {
                Some(p) if !p.trim().is_empty() => p,
                _ => continue,
            };
            let normalized = normalize_phone(phone);
            if !normalized.ends_with(&query.last_four) {
                continue;
            }

            let prior_orders = OrderEntity::find()
                .filter(order::Column::WholesalerId.eq(query.wholesaler_id))
                .filter(order::Column::RetailerId.eq(candidate.id))
                .count(db)
                .await
                .map_err(ServiceError::DatabaseError)?;

            let usable_email = is_usable_email(
                candidate.email.as_deref(),
                wholesaler.contact_email.as_deref(),
            );

            profiles.push(CandidateProfile {
                customer: candidate,
                normalized_phone: normalized,
                prior_orders,
                usable_email,
            });
        }

        if profiles.is_empty() {
            info!("No customer matched the phone suffix");
            return Ok(None);
        }

        let (winner, matched_by) = match profiles.as_slice() {
            [single] => (single, "single_candidate"),
            many => disambiguate(&self.strategies, &query, many).ok_or_else(|| {
                // Only reachable with a custom chain missing a terminal
                // strategy.
                ServiceError::InternalError(
                    "Disambiguation chain produced no winner".to_string(),
                )
            })?,
        };

        info!(
            customer_id = %winner.customer.id,
            matched_by,
            candidates = profiles.len(),
            "Customer resolved"
        );

        Ok(Some(ResolvedCustomer {
            customer_id: winner.customer.id,
            full_name: winner.customer.full_name.clone(),
            email: winner.customer.email.clone(),
            phone: winner.customer.phone.clone(),
            prior_orders: winner.prior_orders,
            matched_by: matched_by.to_string(),
        }))
    }
}
