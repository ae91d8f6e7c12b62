//! PostgreSQL-backed `OrganizationRepository` implementation using Diesel ORM.
//!
//! Membership changes (creating an organization, accepting an invitation,
//! approving a join request) run in a single transaction and only attach
//! users whose `organization_id` is still `NULL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{OrganizationRepository, OrganizationRepositoryError};
use crate::domain::{
    Email, Invitation, InvitationId, InvitationStatus, JoinRequest, JoinRequestId,
    JoinRequestStatus, Organization, OrganizationId, OrganizationSettings, Role, UserId,
};

use super::diesel_basic_error_mapping::{
    is_unique_violation, map_basic_diesel_error, map_basic_pool_error,
};
use super::diesel_helpers::{TxError, collect_rows};
use super::models::{InvitationRow, JoinRequestRow, OrganizationRow, SettingsRow};
use super::pool::{DbPool, PoolError};
use super::schema::{invitations, join_requests, organization_settings, organizations, users};

type Tx = TxError<OrganizationRepositoryError>;

/// Diesel-backed implementation of the `OrganizationRepository` port.
#[derive(Clone)]
pub struct DieselOrganizationRepository {
    pool: DbPool,
}

impl DieselOrganizationRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> OrganizationRepositoryError {
    map_basic_pool_error(error, OrganizationRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> OrganizationRepositoryError {
    if is_unique_violation(&error, None) {
        return OrganizationRepositoryError::duplicate();
    }
    map_basic_diesel_error(
        error,
        OrganizationRepositoryError::query,
        OrganizationRepositoryError::connection,
    )
}

fn map_tx_error(error: Tx) -> OrganizationRepositoryError {
    error.resolve(map_diesel_error)
}

/// Attach a user without an organization to `organization_id`.
async fn attach_user(
    conn: &mut AsyncPgConnection,
    user: Uuid,
    organization_id: Uuid,
    role: Role,
) -> Result<(), Tx> {
    let updated = diesel::update(
        users::table
            .filter(users::id.eq(user))
            .filter(users::organization_id.is_null()),
    )
    .set((
        users::organization_id.eq(organization_id),
        users::role.eq(role.as_str()),
    ))
    .execute(conn)
    .await?;
    if updated == 0 {
        return Err(TxError::Domain(
            OrganizationRepositoryError::already_in_organization(),
        ));
    }
    Ok(())
}

#[async_trait]
impl OrganizationRepository for DieselOrganizationRepository {
    async fn create(
        &self,
        organization: &Organization,
        settings: &OrganizationSettings,
        admin: &UserId,
    ) -> Result<(), OrganizationRepositoryError> {
        let organization_row = OrganizationRow::from(organization);
        let settings_row =
            SettingsRow::from_domain(settings).map_err(OrganizationRepositoryError::query)?;
        let admin = *admin.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, Tx, _>(|conn| {
            async move {
                diesel::insert_into(organizations::table)
                    .values(&organization_row)
                    .execute(conn)
                    .await?;
                diesel::insert_into(organization_settings::table)
                    .values(&settings_row)
                    .execute(conn)
                    .await?;
                attach_user(conn, admin, organization_row.id, Role::Admin).await
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error)
    }

    async fn find(
        &self,
        id: &OrganizationId,
    ) -> Result<Option<Organization>, OrganizationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<OrganizationRow> = organizations::table
            .find(id.as_uuid())
            .select(OrganizationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(Organization::from))
    }

    async fn settings(
        &self,
        id: &OrganizationId,
    ) -> Result<Option<OrganizationSettings>, OrganizationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<SettingsRow> = organization_settings::table
            .find(id.as_uuid())
            .select(SettingsRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(SettingsRow::into_domain)
            .transpose()
            .map_err(OrganizationRepositoryError::query)
    }

    async fn save_settings(
        &self,
        settings: &OrganizationSettings,
    ) -> Result<(), OrganizationRepositoryError> {
        let row = SettingsRow::from_domain(settings).map_err(OrganizationRepositoryError::query)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(organization_settings::table)
            .values(&row)
            .on_conflict(organization_settings::organization_id)
            .do_update()
            .set(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn insert_invitation(
        &self,
        invitation: &Invitation,
    ) -> Result<(), OrganizationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(invitations::table)
            .values(InvitationRow::from_domain(invitation))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_pending_invitation(
        &self,
        organization_id: &OrganizationId,
        email: &Email,
    ) -> Result<Option<Invitation>, OrganizationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<InvitationRow> = invitations::table
            .filter(invitations::organization_id.eq(organization_id.as_uuid()))
            .filter(invitations::email.eq(email.as_ref()))
            .filter(invitations::status.eq(InvitationStatus::Pending.as_str()))
            .select(InvitationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(InvitationRow::into_domain)
            .transpose()
            .map_err(OrganizationRepositoryError::query)
    }

    async fn find_invitation(
        &self,
        id: &InvitationId,
    ) -> Result<Option<Invitation>, OrganizationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<InvitationRow> = invitations::table
            .find(id.as_uuid())
            .select(InvitationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(InvitationRow::into_domain)
            .transpose()
            .map_err(OrganizationRepositoryError::query)
    }

    async fn pending_invitations_for(
        &self,
        email: &Email,
    ) -> Result<Vec<Invitation>, OrganizationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<InvitationRow> = invitations::table
            .filter(invitations::email.eq(email.as_ref()))
            .filter(invitations::status.eq(InvitationStatus::Pending.as_str()))
            .order_by(invitations::created_at.desc())
            .select(InvitationRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(
            rows.into_iter().map(InvitationRow::into_domain),
            OrganizationRepositoryError::query,
        )
    }

    async fn accept_invitation(
        &self,
        invitation: &InvitationId,
        user: &UserId,
    ) -> Result<(), OrganizationRepositoryError> {
        let invitation = *invitation.as_uuid();
        let user = *user.as_uuid();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        conn.transaction::<_, Tx, _>(|conn| {
            async move {
                let organization_id: Option<Uuid> = diesel::update(
                    invitations::table
                        .filter(invitations::id.eq(invitation))
                        .filter(invitations::status.eq(InvitationStatus::Pending.as_str())),
                )
                .set(invitations::status.eq(InvitationStatus::Accepted.as_str()))
                .returning(invitations::organization_id)
                .get_result(conn)
                .await
                .optional()?;
                let organization_id = organization_id
                    .ok_or(TxError::Domain(OrganizationRepositoryError::not_pending()))?;
                attach_user(conn, user, organization_id, Role::Member).await
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error)
    }

    async fn insert_join_request(
        &self,
        request: &JoinRequest,
    ) -> Result<(), OrganizationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(join_requests::table)
            .values(JoinRequestRow::from_domain(request))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_pending_join_request(
        &self,
        organization_id: &OrganizationId,
        user: &UserId,
    ) -> Result<Option<JoinRequest>, OrganizationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<JoinRequestRow> = join_requests::table
            .filter(join_requests::organization_id.eq(organization_id.as_uuid()))
            .filter(join_requests::user_id.eq(user.as_uuid()))
            .filter(join_requests::status.eq(JoinRequestStatus::Pending.as_str()))
            .select(JoinRequestRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(JoinRequestRow::into_domain)
            .transpose()
            .map_err(OrganizationRepositoryError::query)
    }

    async fn find_join_request(
        &self,
        organization_id: &OrganizationId,
        id: &JoinRequestId,
    ) -> Result<Option<JoinRequest>, OrganizationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<JoinRequestRow> = join_requests::table
            .filter(join_requests::id.eq(id.as_uuid()))
            .filter(join_requests::organization_id.eq(organization_id.as_uuid()))
            .select(JoinRequestRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(JoinRequestRow::into_domain)
            .transpose()
            .map_err(OrganizationRepositoryError::query)
    }

    async fn pending_join_requests(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<JoinRequest>, OrganizationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<JoinRequestRow> = join_requests::table
            .filter(join_requests::organization_id.eq(organization_id.as_uuid()))
            .filter(join_requests::status.eq(JoinRequestStatus::Pending.as_str()))
            .order_by(join_requests::created_at.asc())
            .select(JoinRequestRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(
            rows.into_iter().map(JoinRequestRow::into_domain),
            OrganizationRepositoryError::query,
        )
    }

    async fn decide_join_request(
        &self,
        id: &JoinRequestId,
        approve: bool,
        decided_at: DateTime<Utc>,
    ) -> Result<JoinRequest, OrganizationRepositoryError> {
        let id = *id.as_uuid();
        let status = if approve {
            JoinRequestStatus::Approved
        } else {
            JoinRequestStatus::Rejected
        };
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = conn
            .transaction::<_, Tx, _>(|conn| {
                async move {
                    let row: Option<JoinRequestRow> = diesel::update(
                        join_requests::table
                            .filter(join_requests::id.eq(id))
                            .filter(join_requests::status.eq(JoinRequestStatus::Pending.as_str())),
                    )
                    .set((
                        join_requests::status.eq(status.as_str()),
                        join_requests::decided_at.eq(Some(decided_at)),
                    ))
                    .returning(JoinRequestRow::as_returning())
                    .get_result(conn)
                    .await
                    .optional()?;
                    let row =
                        row.ok_or(TxError::Domain(OrganizationRepositoryError::not_pending()))?;
                    if approve {
                        attach_user(conn, row.user_id, row.organization_id, Role::Member).await?;
                    }
                    Ok(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_tx_error)?;
        row.into_domain().map_err(OrganizationRepositoryError::query)
    }
}
