//! Port for organizations, their settings, invitations and join requests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Email, Invitation, InvitationId, JoinRequest, JoinRequestId, Organization,
    OrganizationId, OrganizationSettings, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by organization repository adapters.
    pub enum OrganizationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "organization repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "organization repository query failed: {message}",
        /// A pending invitation or join request already exists.
        Duplicate => "a pending entry already exists",
        /// The invitation or join request was decided concurrently.
        NotPending => "entry is no longer pending",
        /// The user joined an organization in the meantime.
        AlreadyInOrganization => "user already belongs to an organization",
    }
}

/// Storage for tenants and membership workflows.
///
/// Methods that change a user's membership only touch users that do not yet
/// belong to an organization, and fail with
/// [`OrganizationRepositoryError::AlreadyInOrganization`] otherwise. Each runs
/// in one transaction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    /// Insert the organization and its settings and make `admin` its admin.
    async fn create(
        &self,
        organization: &Organization,
        settings: &OrganizationSettings,
        admin: &UserId,
    ) -> Result<(), OrganizationRepositoryError>;

    /// Fetch an organization.
    async fn find(
        &self,
        id: &OrganizationId,
    ) -> Result<Option<Organization>, OrganizationRepositoryError>;

    /// Fetch organization settings.
    async fn settings(
        &self,
        id: &OrganizationId,
    ) -> Result<Option<OrganizationSettings>, OrganizationRepositoryError>;

    /// Replace organization settings.
    async fn save_settings(
        &self,
        settings: &OrganizationSettings,
    ) -> Result<(), OrganizationRepositoryError>;

    /// Record a pending invitation.
    async fn insert_invitation(
        &self,
        invitation: &Invitation,
    ) -> Result<(), OrganizationRepositoryError>;

    /// Pending invitation of `email` into `organization_id`.
    async fn find_pending_invitation(
        &self,
        organization_id: &OrganizationId,
        email: &Email,
    ) -> Result<Option<Invitation>, OrganizationRepositoryError>;

    /// Fetch an invitation by id.
    async fn find_invitation(
        &self,
        id: &InvitationId,
    ) -> Result<Option<Invitation>, OrganizationRepositoryError>;

    /// Pending invitations addressed to `email`, newest first.
    async fn pending_invitations_for(
        &self,
        email: &Email,
    ) -> Result<Vec<Invitation>, OrganizationRepositoryError>;

    /// Mark the invitation accepted and add `user` as a member.
    async fn accept_invitation(
        &self,
        invitation: &InvitationId,
        user: &UserId,
    ) -> Result<(), OrganizationRepositoryError>;

    /// Record a pending join request.
    async fn insert_join_request(
        &self,
        request: &JoinRequest,
    ) -> Result<(), OrganizationRepositoryError>;

    /// Pending join request of `user` for `organization_id`.
    async fn find_pending_join_request(
        &self,
        organization_id: &OrganizationId,
        user: &UserId,
    ) -> Result<Option<JoinRequest>, OrganizationRepositoryError>;

    /// Fetch a join request addressed to `organization_id`.
    async fn find_join_request(
        &self,
        organization_id: &OrganizationId,
        id: &JoinRequestId,
    ) -> Result<Option<JoinRequest>, OrganizationRepositoryError>;

    /// Pending join requests for `organization_id`, oldest first.
    async fn pending_join_requests(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<JoinRequest>, OrganizationRepositoryError>;

    /// Approve or reject a pending request. Approval adds the requester as a
    /// member.
    async fn decide_join_request(
        &self,
        id: &JoinRequestId,
        approve: bool,
        decided_at: DateTime<Utc>,
    ) -> Result<JoinRequest, OrganizationRepositoryError>;
}
