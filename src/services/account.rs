use crate::{
    auth::Identity,
    errors::ServiceError,
    models::{Profile, UserRole, UserRoleRecord},
    query::{ListQuery, QueryFacade},
};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

/// The caller's profile and role; either may not be set up yet
#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    pub user_id: Uuid,
    pub profile: Option<Profile>,
    pub role: Option<UserRole>,
}

#[derive(Clone)]
pub struct AccountService {
    facade: QueryFacade,
}

impl AccountService {
    pub fn new(facade: QueryFacade) -> Self {
        Self { facade }
    }

    #[instrument(skip(self), fields(user_id = %identity.user_id))]
    pub async fn summary(&self, identity: &Identity) -> Result<AccountSummary, ServiceError> {
        let (profile, role) = tokio::try_join!(
            self.facade
                .first::<Profile>(ListQuery::new().eq("id", identity.user_id)),
            self.facade
                .first::<UserRoleRecord>(ListQuery::new().eq("user_id", identity.user_id)),
        )?;

        Ok(AccountSummary {
            user_id: identity.user_id,
            profile,
            role: role.map(|record| record.role),
        })
    }
}
