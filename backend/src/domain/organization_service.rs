//! Organization, membership and settings service.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::account_service::map_user_error;
use crate::domain::ports::{
    OrganizationRepository, OrganizationRepositoryError, OrganizationService, UserRepository,
};
use crate::domain::{
    Email, Error, ErrorCode, Invitation, InvitationId, InvitationStatus, JoinRequest,
    JoinRequestId, JoinRequestStatus, NewNotification, NotificationPublisher, Organization,
    OrganizationId, OrganizationSettings, SettingsUpdate, TenantContext, User, optional_text,
};

/// Maximum length of a join request message.
pub const JOIN_MESSAGE_MAX: usize = 500;

fn map_organization_error(error: OrganizationRepositoryError) -> Error {
    match error {
        OrganizationRepositoryError::Connection { message } => Error::service_unavailable(
            format!("organization repository unavailable: {message}"),
        ),
        OrganizationRepositoryError::Query { message } => {
            Error::internal(format!("organization repository error: {message}"))
        }
        OrganizationRepositoryError::Duplicate => Error::conflict("a pending entry already exists"),
        OrganizationRepositoryError::NotPending => Error::new(
            ErrorCode::RequestNotPending,
            "the request is no longer pending",
        ),
        OrganizationRepositoryError::AlreadyInOrganization => already_in_organization(),
    }
}

fn already_in_organization() -> Error {
    Error::new(
        ErrorCode::AlreadyInOrganization,
        "user already belongs to an organization",
    )
}

fn invitation_not_found() -> Error {
    Error::new(ErrorCode::InvitationNotFound, "invitation not found")
}

/// Organization service implementing the driving port.
#[derive(Clone)]
pub struct OrganizationServiceImpl<O, U> {
    organizations: Arc<O>,
    users: Arc<U>,
    notifications: NotificationPublisher,
    clock: Arc<dyn Clock>,
}

impl<O, U> OrganizationServiceImpl<O, U> {
    /// Create a new service.
    pub fn new(
        organizations: Arc<O>,
        users: Arc<U>,
        notifications: NotificationPublisher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            organizations,
            users,
            notifications,
            clock,
        }
    }
}

impl<O, U> OrganizationServiceImpl<O, U>
where
    O: OrganizationRepository,
    U: UserRepository,
{
    async fn load(&self, id: &OrganizationId) -> Result<Organization, Error> {
        self.organizations
            .find(id)
            .await
            .map_err(map_organization_error)?
            .ok_or_else(|| Error::new(ErrorCode::OrganizationNotFound, "organization not found"))
    }

    async fn load_settings(&self, id: OrganizationId) -> Result<OrganizationSettings, Error> {
        let stored = self
            .organizations
            .settings(&id)
            .await
            .map_err(map_organization_error)?;
        Ok(stored.unwrap_or_else(|| OrganizationSettings::defaults(id, self.clock.utc())))
    }
}

#[async_trait]
impl<O, U> OrganizationService for OrganizationServiceImpl<O, U>
where
    O: OrganizationRepository,
    U: UserRepository,
{
    async fn create(&self, user: &User, name: String) -> Result<Organization, Error> {
        if user.organization_id.is_some() {
            return Err(already_in_organization());
        }
        let now = self.clock.utc();
        let organization = Organization::create(&name, now)?;
        let settings = OrganizationSettings::defaults(organization.id, now);
        self.organizations
            .create(&organization, &settings, &user.id)
            .await
            .map_err(map_organization_error)?;
        info!(organization_id = %organization.id, admin = %user.id, "created organization");
        Ok(organization)
    }

    async fn current(&self, tenant: &TenantContext) -> Result<Organization, Error> {
        self.load(&tenant.organization_id).await
    }

    async fn members(&self, tenant: &TenantContext) -> Result<Vec<User>, Error> {
        self.users
            .list_members(&tenant.organization_id)
            .await
            .map_err(map_user_error)
    }

    async fn invite(&self, tenant: &TenantContext, email: Email) -> Result<Invitation, Error> {
        tenant.require_admin()?;
        let existing_member = self
            .users
            .find_member_by_email(&tenant.organization_id, &email)
            .await
            .map_err(map_user_error)?;
        if existing_member.is_some() {
            return Err(Error::new(
                ErrorCode::AlreadyMember,
                "this email already belongs to a member",
            ));
        }
        let invitation_exists = || {
            Error::new(
                ErrorCode::InvitationExists,
                "a pending invitation already exists for this email",
            )
        };
        if self
            .organizations
            .find_pending_invitation(&tenant.organization_id, &email)
            .await
            .map_err(map_organization_error)?
            .is_some()
        {
            return Err(invitation_exists());
        }

        let invitation = Invitation {
            id: InvitationId::random(),
            organization_id: tenant.organization_id,
            email,
            invited_by: tenant.user_id,
            status: InvitationStatus::Pending,
            created_at: self.clock.utc(),
        };
        match self.organizations.insert_invitation(&invitation).await {
            Ok(()) => {}
            Err(OrganizationRepositoryError::Duplicate) => return Err(invitation_exists()),
            Err(other) => return Err(map_organization_error(other)),
        }
        info!(invitation_id = %invitation.id, organization_id = %tenant.organization_id, "invited user");
        Ok(invitation)
    }

    async fn invitations_for(&self, user: &User) -> Result<Vec<Invitation>, Error> {
        self.organizations
            .pending_invitations_for(&user.email)
            .await
            .map_err(map_organization_error)
    }

    async fn accept_invitation(
        &self,
        user: &User,
        invitation: InvitationId,
    ) -> Result<Organization, Error> {
        if user.organization_id.is_some() {
            return Err(already_in_organization());
        }
        let found = self
            .organizations
            .find_invitation(&invitation)
            .await
            .map_err(map_organization_error)?
            .filter(|found| found.email == user.email && found.status == InvitationStatus::Pending)
            .ok_or_else(invitation_not_found)?;

        match self.organizations.accept_invitation(&found.id, &user.id).await {
            Ok(()) => {}
            Err(OrganizationRepositoryError::NotPending) => return Err(invitation_not_found()),
            Err(other) => return Err(map_organization_error(other)),
        }
        info!(invitation_id = %found.id, user_id = %user.id, "accepted invitation");
        self.load(&found.organization_id).await
    }

    async fn request_to_join(
        &self,
        user: &User,
        organization: OrganizationId,
        message: Option<String>,
    ) -> Result<JoinRequest, Error> {
        if user.organization_id.is_some() {
            return Err(already_in_organization());
        }
        let message = optional_text("message", message.as_deref(), JOIN_MESSAGE_MAX)?;
        self.load(&organization).await?;

        let request_exists = || {
            Error::new(
                ErrorCode::RequestExists,
                "a pending request to join this organization already exists",
            )
        };
        if self
            .organizations
            .find_pending_join_request(&organization, &user.id)
            .await
            .map_err(map_organization_error)?
            .is_some()
        {
            return Err(request_exists());
        }

        let request = JoinRequest {
            id: JoinRequestId::random(),
            organization_id: organization,
            user_id: user.id,
            message,
            status: JoinRequestStatus::Pending,
            created_at: self.clock.utc(),
            decided_at: None,
        };
        match self.organizations.insert_join_request(&request).await {
            Ok(()) => {}
            Err(OrganizationRepositoryError::Duplicate) => return Err(request_exists()),
            Err(other) => return Err(map_organization_error(other)),
        }
        info!(request_id = %request.id, %organization, "join request submitted");
        self.notifications
            .publish(NewNotification::join_request(&request, user))
            .await;
        Ok(request)
    }

    async fn pending_requests(&self, tenant: &TenantContext) -> Result<Vec<JoinRequest>, Error> {
        tenant.require_admin()?;
        self.organizations
            .pending_join_requests(&tenant.organization_id)
            .await
            .map_err(map_organization_error)
    }

    async fn decide_request(
        &self,
        tenant: &TenantContext,
        request: JoinRequestId,
        approve: bool,
    ) -> Result<JoinRequest, Error> {
        tenant.require_admin()?;
        let found = self
            .organizations
            .find_join_request(&tenant.organization_id, &request)
            .await
            .map_err(map_organization_error)?
            .ok_or_else(|| Error::new(ErrorCode::RequestNotFound, "join request not found"))?;
        if found.status != JoinRequestStatus::Pending {
            return Err(Error::new(
                ErrorCode::RequestNotPending,
                format!("join request is already {}", found.status),
            ));
        }

        let decided = self
            .organizations
            .decide_join_request(&found.id, approve, self.clock.utc())
            .await
            .map_err(map_organization_error)?;
        info!(request_id = %decided.id, status = decided.status.as_str(), "join request decided");
        Ok(decided)
    }

    async fn settings(&self, tenant: &TenantContext) -> Result<OrganizationSettings, Error> {
        self.load_settings(tenant.organization_id).await
    }

    async fn update_settings(
        &self,
        tenant: &TenantContext,
        update: SettingsUpdate,
    ) -> Result<OrganizationSettings, Error> {
        tenant.require_admin()?;
        let mut settings = self.load_settings(tenant.organization_id).await?;
        settings.apply(update, self.clock.utc());
        self.organizations
            .save_settings(&settings)
            .await
            .map_err(map_organization_error)?;
        Ok(settings)
    }
}
