//! Driving port for organizations and membership.

use async_trait::async_trait;

use crate::domain::{
    Email, Error, Invitation, InvitationId, JoinRequest, JoinRequestId, Organization,
    OrganizationId, OrganizationSettings, SettingsUpdate, TenantContext, User,
};

/// Organization lifecycle, invitations, join requests and settings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrganizationService: Send + Sync {
    /// Create an organization with `user` as its admin.
    async fn create(&self, user: &User, name: String) -> Result<Organization, Error>;

    /// The caller's organization.
    async fn current(&self, tenant: &TenantContext) -> Result<Organization, Error>;

    /// Members of the caller's organization.
    async fn members(&self, tenant: &TenantContext) -> Result<Vec<User>, Error>;

    /// Invite `email` to the caller's organization (admin only).
    async fn invite(&self, tenant: &TenantContext, email: Email) -> Result<Invitation, Error>;

    /// Pending invitations addressed to `user`.
    async fn invitations_for(&self, user: &User) -> Result<Vec<Invitation>, Error>;

    /// Accept an invitation addressed to `user`.
    async fn accept_invitation(
        &self,
        user: &User,
        invitation: InvitationId,
    ) -> Result<Organization, Error>;

    /// Ask to join an organization.
    async fn request_to_join(
        &self,
        user: &User,
        organization: OrganizationId,
        message: Option<String>,
    ) -> Result<JoinRequest, Error>;

    /// Pending join requests for the caller's organization (admin only).
    async fn pending_requests(&self, tenant: &TenantContext) -> Result<Vec<JoinRequest>, Error>;

    /// Approve or reject a join request (admin only).
    async fn decide_request(
        &self,
        tenant: &TenantContext,
        request: JoinRequestId,
        approve: bool,
    ) -> Result<JoinRequest, Error>;

    /// The caller's organization settings.
    async fn settings(&self, tenant: &TenantContext) -> Result<OrganizationSettings, Error>;

    /// Replace the caller's organization settings (admin only).
    async fn update_settings(
        &self,
        tenant: &TenantContext,
        update: SettingsUpdate,
    ) -> Result<OrganizationSettings, Error>;
}
