//! In-memory driven adapters for tests.
//!
//! [`InMemoryBackOffice`] implements every repository port over a single
//! mutex-guarded set of tables, mirroring the constraints the Diesel
//! adapters enforce in SQL: tenancy filters, unique pending entries, guarded
//! stock updates and the referential checks on delete. Integration tests in
//! `tests/` drive the real domain services through it without a database.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use pagination::PageRequest;

use crate::domain::ports::{
    CatalogRepository, CatalogRepositoryError, ClientRepository, ClientRepositoryError,
    CourierRepository, CourierRepositoryError, FixtureTokenVerifier, NotificationRepository,
    NotificationRepositoryError, OrderRepository, OrderRepositoryError, OrganizationRepository,
    OrganizationRepositoryError, ProductRemoval, UserRepository, UserRepositoryError,
};
use crate::domain::{
    Category, CategoryId, Client, ClientId, Courier, CourierId, Email, FirebaseUid, Invitation,
    InvitationId, InvitationStatus, JoinRequest, JoinRequestId, JoinRequestStatus, Notification,
    NotificationFilter, NotificationId, Order, OrderAssignment, OrderFilter, OrderId,
    OrderStatus, Organization, OrganizationId, OrganizationSettings, Product, ProductFilter,
    ProductId, Reservations, Role, User, UserId, VerifiedIdentity,
};
use crate::inbound::http::state::{Adapters, HttpState};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    organizations: Vec<Organization>,
    settings: HashMap<OrganizationId, OrganizationSettings>,
    invitations: Vec<Invitation>,
    join_requests: Vec<JoinRequest>,
    categories: Vec<Category>,
    products: Vec<Product>,
    clients: Vec<Client>,
    couriers: Vec<Courier>,
    orders: Vec<Order>,
    assignments: HashMap<OrderId, OrderAssignment>,
    notifications: Vec<Notification>,
}

impl Tables {
    /// Give a user without an organization a membership.
    fn attach_user(
        &mut self,
        user: &UserId,
        organization_id: OrganizationId,
        role: Role,
    ) -> Result<(), OrganizationRepositoryError> {
        let user = self
            .users
            .iter_mut()
            .find(|candidate| candidate.id == *user && candidate.organization_id.is_none())
            .ok_or_else(OrganizationRepositoryError::already_in_organization)?;
        user.organization_id = Some(organization_id);
        user.role = role;
        Ok(())
    }

    fn product_mut(
        &mut self,
        organization_id: &OrganizationId,
        id: &ProductId,
    ) -> Option<&mut Product> {
        self.products
            .iter_mut()
            .find(|product| product.id == *id && product.organization_id == *organization_id)
    }

    /// Apply signed stock movements atomically.
    ///
    /// Positive deltas take stock and fail when a product is missing or short;
    /// negative deltas return stock to products that still exist. Nothing is
    /// written unless every movement succeeds.
    fn move_stock(
        &mut self,
        organization_id: &OrganizationId,
        deltas: &BTreeMap<ProductId, i64>,
    ) -> Result<Vec<Product>, OrderRepositoryError> {
        let mut next = Vec::with_capacity(deltas.len());
        for (product_id, delta) in deltas {
            let current = self
                .products
                .iter()
                .find(|p| p.id == *product_id && p.organization_id == *organization_id);
            let Some(product) = current else {
                if *delta > 0 {
                    return Err(OrderRepositoryError::insufficient_stock(*product_id));
                }
                continue;
            };
            let stock = i64::from(product.stock) - delta;
            let stock = u32::try_from(stock)
                .map_err(|_| OrderRepositoryError::insufficient_stock(*product_id))?;
            next.push((*product_id, stock));
        }

        let mut touched = Vec::with_capacity(next.len());
        for (product_id, stock) in next {
            if let Some(product) = self.product_mut(organization_id, &product_id) {
                product.stock = stock;
                touched.push(product.clone());
            }
        }
        Ok(touched)
    }

    fn restock(
        &mut self,
        organization_id: &OrganizationId,
        restock: &Reservations,
    ) -> Result<(), OrderRepositoryError> {
        let deltas: BTreeMap<ProductId, i64> = restock
            .iter()
            .map(|(product_id, quantity)| (*product_id, -i64::from(*quantity)))
            .collect();
        self.move_stock(organization_id, &deltas).map(|_| ())
    }

    fn with_assignment(&self, order: &Order) -> Order {
        let mut order = order.clone();
        order.assignment = self.assignments.get(&order.id).cloned();
        order
    }
}

/// Rows for one page, over-fetching a single row like the SQL adapters.
fn page_window<T: Clone>(rows: Vec<&T>, page: &PageRequest) -> Vec<T> {
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.fetch_limit()).unwrap_or(usize::MAX);
    rows.into_iter().skip(offset).take(limit).cloned().collect()
}

fn contains_ignoring_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Shared in-memory store implementing every repository port.
///
/// Clones share the same tables.
///
/// # Examples
/// ```
/// use std::sync::Arc;
///
/// use backoffice::domain::ports::FixtureTokenVerifier;
/// use backoffice::test_support::InMemoryBackOffice;
/// use mockable::DefaultClock;
///
/// let store = InMemoryBackOffice::new();
/// let _state = store.http_state(FixtureTokenVerifier::default(), Arc::new(DefaultClock));
/// ```
#[derive(Clone, Default)]
pub struct InMemoryBackOffice {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryBackOffice {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wire the domain services over this store.
    #[must_use]
    pub fn http_state(&self, verifier: FixtureTokenVerifier, clock: Arc<dyn Clock>) -> HttpState {
        HttpState::wire(
            Adapters {
                verifier: Arc::new(verifier),
                users: Arc::new(self.clone()),
                organizations: Arc::new(self.clone()),
                catalog: Arc::new(self.clone()),
                clients: Arc::new(self.clone()),
                couriers: Arc::new(self.clone()),
                orders: Arc::new(self.clone()),
                notifications: Arc::new(self.clone()),
            },
            clock,
        )
    }

    /// Current stock of a product, if it exists.
    #[must_use]
    pub fn stock_of(&self, id: &ProductId) -> Option<u32> {
        self.tables()
            .products
            .iter()
            .find(|product| product.id == *id)
            .map(|product| product.stock)
    }
}

/// Identity asserted by a fixture token with a verified email.
///
/// # Panics
/// Panics when `uid` or `email` are not valid identifiers.
#[must_use]
pub fn verified_identity(uid: &str, email: &str, name: &str) -> VerifiedIdentity {
    VerifiedIdentity {
        uid: FirebaseUid::new(uid).expect("fixture uid"),
        email: Some(Email::new(email).expect("fixture email")),
        name: Some(name.to_owned()),
    }
}

#[async_trait]
impl UserRepository for InMemoryBackOffice {
    async fn find_by_firebase_uid(
        &self,
        uid: &FirebaseUid,
    ) -> Result<Option<User>, UserRepositoryError> {
        Ok(self
            .tables()
            .users
            .iter()
            .find(|user| user.firebase_uid == *uid)
            .cloned())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserRepositoryError> {
        Ok(self.tables().users.iter().find(|user| user.id == *id).cloned())
    }

    async fn insert(&self, user: &User) -> Result<(), UserRepositoryError> {
        let mut tables = self.tables();
        if tables
            .users
            .iter()
            .any(|existing| existing.firebase_uid == user.firebase_uid)
        {
            return Err(UserRepositoryError::duplicate());
        }
        tables.users.push(user.clone());
        Ok(())
    }

    async fn list_members(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<User>, UserRepositoryError> {
        let tables = self.tables();
        let mut members: Vec<User> = tables
            .users
            .iter()
            .filter(|user| user.organization_id == Some(*organization_id))
            .cloned()
            .collect();
        members.sort_by(|a, b| {
            a.display_name
                .as_ref()
                .cmp(b.display_name.as_ref())
                .then(a.id.cmp(&b.id))
        });
        Ok(members)
    }

    async fn find_member_by_email(
        &self,
        organization_id: &OrganizationId,
        email: &Email,
    ) -> Result<Option<User>, UserRepositoryError> {
        Ok(self
            .tables()
            .users
            .iter()
            .find(|user| user.organization_id == Some(*organization_id) && user.email == *email)
            .cloned())
    }
}

#[async_trait]
impl OrganizationRepository for InMemoryBackOffice {
    async fn create(
        &self,
        organization: &Organization,
        settings: &OrganizationSettings,
        admin: &UserId,
    ) -> Result<(), OrganizationRepositoryError> {
        let mut tables = self.tables();
        tables.attach_user(admin, organization.id, Role::Admin)?;
        tables.organizations.push(organization.clone());
        tables.settings.insert(organization.id, settings.clone());
        Ok(())
    }

    async fn find(
        &self,
        id: &OrganizationId,
    ) -> Result<Option<Organization>, OrganizationRepositoryError> {
        Ok(self
            .tables()
            .organizations
            .iter()
            .find(|organization| organization.id == *id)
            .cloned())
    }

    async fn settings(
        &self,
        id: &OrganizationId,
    ) -> Result<Option<OrganizationSettings>, OrganizationRepositoryError> {
        Ok(self.tables().settings.get(id).cloned())
    }

    async fn save_settings(
        &self,
        settings: &OrganizationSettings,
    ) -> Result<(), OrganizationRepositoryError> {
        self.tables()
            .settings
            .insert(settings.organization_id, settings.clone());
        Ok(())
    }

    async fn insert_invitation(
        &self,
        invitation: &Invitation,
    ) -> Result<(), OrganizationRepositoryError> {
        let mut tables = self.tables();
        let duplicate = tables.invitations.iter().any(|existing| {
            existing.organization_id == invitation.organization_id
                && existing.email == invitation.email
                && existing.status == InvitationStatus::Pending
        });
        if duplicate {
            return Err(OrganizationRepositoryError::duplicate());
        }
        tables.invitations.push(invitation.clone());
        Ok(())
    }

    async fn find_pending_invitation(
        &self,
        organization_id: &OrganizationId,
        email: &Email,
    ) -> Result<Option<Invitation>, OrganizationRepositoryError> {
        Ok(self
            .tables()
            .invitations
            .iter()
            .find(|invitation| {
                invitation.organization_id == *organization_id
                    && invitation.email == *email
                    && invitation.status == InvitationStatus::Pending
            })
            .cloned())
    }

    async fn find_invitation(
        &self,
        id: &InvitationId,
    ) -> Result<Option<Invitation>, OrganizationRepositoryError> {
        Ok(self
            .tables()
            .invitations
            .iter()
            .find(|invitation| invitation.id == *id)
            .cloned())
    }

    async fn pending_invitations_for(
        &self,
        email: &Email,
    ) -> Result<Vec<Invitation>, OrganizationRepositoryError> {
        let mut pending: Vec<Invitation> = self
            .tables()
            .invitations
            .iter()
            .filter(|invitation| {
                invitation.email == *email && invitation.status == InvitationStatus::Pending
            })
            .cloned()
            .collect();
        pending.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(pending)
    }

    async fn accept_invitation(
        &self,
        invitation: &InvitationId,
        user: &UserId,
    ) -> Result<(), OrganizationRepositoryError> {
        let mut tables = self.tables();
        let index = tables
            .invitations
            .iter()
            .position(|candidate| {
                candidate.id == *invitation && candidate.status == InvitationStatus::Pending
            })
            .ok_or_else(OrganizationRepositoryError::not_pending)?;
        let organization_id = tables.invitations[index].organization_id;
        tables.attach_user(user, organization_id, Role::Member)?;
        tables.invitations[index].status = InvitationStatus::Accepted;
        Ok(())
    }

    async fn insert_join_request(
        &self,
        request: &JoinRequest,
    ) -> Result<(), OrganizationRepositoryError> {
        let mut tables = self.tables();
        let duplicate = tables.join_requests.iter().any(|existing| {
            existing.organization_id == request.organization_id
                && existing.user_id == request.user_id
                && existing.status == JoinRequestStatus::Pending
        });
        if duplicate {
            return Err(OrganizationRepositoryError::duplicate());
        }
        tables.join_requests.push(request.clone());
        Ok(())
    }

    async fn find_pending_join_request(
        &self,
        organization_id: &OrganizationId,
        user: &UserId,
    ) -> Result<Option<JoinRequest>, OrganizationRepositoryError> {
        Ok(self
            .tables()
            .join_requests
            .iter()
            .find(|request| {
                request.organization_id == *organization_id
                    && request.user_id == *user
                    && request.status == JoinRequestStatus::Pending
            })
            .cloned())
    }

    async fn find_join_request(
        &self,
        organization_id: &OrganizationId,
        id: &JoinRequestId,
    ) -> Result<Option<JoinRequest>, OrganizationRepositoryError> {
        Ok(self
            .tables()
            .join_requests
            .iter()
            .find(|request| request.id == *id && request.organization_id == *organization_id)
            .cloned())
    }

    async fn pending_join_requests(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<JoinRequest>, OrganizationRepositoryError> {
        let mut pending: Vec<JoinRequest> = self
            .tables()
            .join_requests
            .iter()
            .filter(|request| {
                request.organization_id == *organization_id
                    && request.status == JoinRequestStatus::Pending
            })
            .cloned()
            .collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(pending)
    }

    async fn decide_join_request(
        &self,
        id: &JoinRequestId,
        approve: bool,
        decided_at: DateTime<Utc>,
    ) -> Result<JoinRequest, OrganizationRepositoryError> {
        let mut tables = self.tables();
        let index = tables
            .join_requests
            .iter()
            .position(|request| request.id == *id && request.status == JoinRequestStatus::Pending)
            .ok_or_else(OrganizationRepositoryError::not_pending)?;
        if approve {
            let (user, organization_id) = {
                let request = &tables.join_requests[index];
                (request.user_id, request.organization_id)
            };
            tables.attach_user(&user, organization_id, Role::Member)?;
        }
        let request = &mut tables.join_requests[index];
        request.status = if approve {
            JoinRequestStatus::Approved
        } else {
            JoinRequestStatus::Rejected
        };
        request.decided_at = Some(decided_at);
        Ok(request.clone())
    }
}

#[async_trait]
impl CatalogRepository for InMemoryBackOffice {
    async fn list_categories(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<Vec<Category>, CatalogRepositoryError> {
        let mut categories: Vec<Category> = self
            .tables()
            .categories
            .iter()
            .filter(|category| category.organization_id == *organization_id)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(categories)
    }

    async fn find_category(
        &self,
        organization_id: &OrganizationId,
        id: &CategoryId,
    ) -> Result<Option<Category>, CatalogRepositoryError> {
        Ok(self
            .tables()
            .categories
            .iter()
            .find(|category| category.id == *id && category.organization_id == *organization_id)
            .cloned())
    }

    async fn insert_category(&self, category: &Category) -> Result<(), CatalogRepositoryError> {
        let mut tables = self.tables();
        let taken = tables.categories.iter().any(|existing| {
            existing.organization_id == category.organization_id && existing.name == category.name
        });
        if taken {
            return Err(CatalogRepositoryError::duplicate_category());
        }
        tables.categories.push(category.clone());
        Ok(())
    }

    async fn update_category(&self, category: &Category) -> Result<bool, CatalogRepositoryError> {
        let mut tables = self.tables();
        let taken = tables.categories.iter().any(|existing| {
            existing.organization_id == category.organization_id
                && existing.name == category.name
                && existing.id != category.id
        });
        if taken {
            return Err(CatalogRepositoryError::duplicate_category());
        }
        let Some(existing) = tables.categories.iter_mut().find(|existing| {
            existing.id == category.id && existing.organization_id == category.organization_id
        }) else {
            return Ok(false);
        };
        *existing = category.clone();
        Ok(true)
    }

    async fn delete_category(
        &self,
        organization_id: &OrganizationId,
        id: &CategoryId,
    ) -> Result<bool, CatalogRepositoryError> {
        let mut tables = self.tables();
        if tables
            .products
            .iter()
            .any(|product| product.category_id == Some(*id))
        {
            return Err(CatalogRepositoryError::category_in_use());
        }
        let before = tables.categories.len();
        tables
            .categories
            .retain(|category| !(category.id == *id && category.organization_id == *organization_id));
        Ok(tables.categories.len() < before)
    }

    async fn list_products(
        &self,
        organization_id: &OrganizationId,
        filter: &ProductFilter,
        page: &PageRequest,
    ) -> Result<Vec<Product>, CatalogRepositoryError> {
        let tables = self.tables();
        let mut rows: Vec<&Product> = tables
            .products
            .iter()
            .filter(|product| product.organization_id == *organization_id)
            .filter(|product| {
                filter
                    .category_id
                    .is_none_or(|category| product.category_id == Some(category))
            })
            .filter(|product| {
                filter
                    .search
                    .as_deref()
                    .is_none_or(|search| contains_ignoring_case(&product.name, search))
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(page_window(rows, page))
    }

    async fn find_product(
        &self,
        organization_id: &OrganizationId,
        id: &ProductId,
    ) -> Result<Option<Product>, CatalogRepositoryError> {
        Ok(self
            .tables()
            .products
            .iter()
            .find(|product| product.id == *id && product.organization_id == *organization_id)
            .cloned())
    }

    async fn find_products(
        &self,
        organization_id: &OrganizationId,
        ids: &[ProductId],
    ) -> Result<Vec<Product>, CatalogRepositoryError> {
        Ok(self
            .tables()
            .products
            .iter()
            .filter(|product| {
                product.organization_id == *organization_id && ids.contains(&product.id)
            })
            .cloned()
            .collect())
    }

    async fn insert_product(&self, product: &Product) -> Result<(), CatalogRepositoryError> {
        self.tables().products.push(product.clone());
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<bool, CatalogRepositoryError> {
        let mut tables = self.tables();
        let Some(existing) = tables.product_mut(&product.organization_id, &product.id) else {
            return Ok(false);
        };
        *existing = product.clone();
        Ok(true)
    }

    async fn remove_product(
        &self,
        organization_id: &OrganizationId,
        id: &ProductId,
    ) -> Result<Option<ProductRemoval>, CatalogRepositoryError> {
        let mut tables = self.tables();
        let referenced = tables
            .orders
            .iter()
            .any(|order| order.details.iter().any(|detail| detail.product_id == *id));
        let Some(product) = tables.product_mut(organization_id, id) else {
            return Ok(None);
        };
        if referenced {
            product.active = false;
            return Ok(Some(ProductRemoval::Deactivated));
        }
        tables
            .products
            .retain(|product| !(product.id == *id && product.organization_id == *organization_id));
        Ok(Some(ProductRemoval::Deleted))
    }

    async fn adjust_stock(
        &self,
        organization_id: &OrganizationId,
        id: &ProductId,
        delta: i64,
    ) -> Result<Option<Product>, CatalogRepositoryError> {
        let mut tables = self.tables();
        let Some(product) = tables.product_mut(organization_id, id) else {
            return Ok(None);
        };
        let stock = i64::from(product.stock)
            .checked_add(delta)
            .ok_or_else(|| CatalogRepositoryError::query("stock adjustment out of range"))?;
        if stock < 0 {
            return Err(CatalogRepositoryError::insufficient_stock(*id));
        }
        product.stock = u32::try_from(stock)
            .map_err(|_| CatalogRepositoryError::query("stock adjustment out of range"))?;
        Ok(Some(product.clone()))
    }
}

#[async_trait]
impl ClientRepository for InMemoryBackOffice {
    async fn list(
        &self,
        organization_id: &OrganizationId,
        search: Option<String>,
        page: &PageRequest,
    ) -> Result<Vec<Client>, ClientRepositoryError> {
        let tables = self.tables();
        let mut rows: Vec<&Client> = tables
            .clients
            .iter()
            .filter(|client| client.organization_id == *organization_id)
            .filter(|client| {
                search
                    .as_deref()
                    .is_none_or(|search| contains_ignoring_case(&client.name, search))
            })
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(page_window(rows, page))
    }

    async fn find(
        &self,
        organization_id: &OrganizationId,
        id: &ClientId,
    ) -> Result<Option<Client>, ClientRepositoryError> {
        Ok(self
            .tables()
            .clients
            .iter()
            .find(|client| client.id == *id && client.organization_id == *organization_id)
            .cloned())
    }

    async fn insert(&self, client: &Client) -> Result<(), ClientRepositoryError> {
        self.tables().clients.push(client.clone());
        Ok(())
    }

    async fn update(&self, client: &Client) -> Result<bool, ClientRepositoryError> {
        let mut tables = self.tables();
        let Some(existing) = tables.clients.iter_mut().find(|existing| {
            existing.id == client.id && existing.organization_id == client.organization_id
        }) else {
            return Ok(false);
        };
        *existing = client.clone();
        Ok(true)
    }

    async fn delete(
        &self,
        organization_id: &OrganizationId,
        id: &ClientId,
    ) -> Result<bool, ClientRepositoryError> {
        let mut tables = self.tables();
        if tables.orders.iter().any(|order| order.client_id == *id) {
            return Err(ClientRepositoryError::has_orders());
        }
        let before = tables.clients.len();
        tables
            .clients
            .retain(|client| !(client.id == *id && client.organization_id == *organization_id));
        Ok(tables.clients.len() < before)
    }
}

#[async_trait]
impl CourierRepository for InMemoryBackOffice {
    async fn list(
        &self,
        organization_id: &OrganizationId,
        active: Option<bool>,
        page: &PageRequest,
    ) -> Result<Vec<Courier>, CourierRepositoryError> {
        let tables = self.tables();
        let mut rows: Vec<&Courier> = tables
            .couriers
            .iter()
            .filter(|courier| courier.organization_id == *organization_id)
            .filter(|courier| active.is_none_or(|active| courier.active == active))
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(page_window(rows, page))
    }

    async fn find(
        &self,
        organization_id: &OrganizationId,
        id: &CourierId,
    ) -> Result<Option<Courier>, CourierRepositoryError> {
        Ok(self
            .tables()
            .couriers
            .iter()
            .find(|courier| courier.id == *id && courier.organization_id == *organization_id)
            .cloned())
    }

    async fn insert(&self, courier: &Courier) -> Result<(), CourierRepositoryError> {
        self.tables().couriers.push(courier.clone());
        Ok(())
    }

    async fn update(&self, courier: &Courier) -> Result<bool, CourierRepositoryError> {
        let mut tables = self.tables();
        let Some(existing) = tables.couriers.iter_mut().find(|existing| {
            existing.id == courier.id && existing.organization_id == courier.organization_id
        }) else {
            return Ok(false);
        };
        *existing = courier.clone();
        Ok(true)
    }

    async fn delete(
        &self,
        organization_id: &OrganizationId,
        id: &CourierId,
    ) -> Result<bool, CourierRepositoryError> {
        let mut tables = self.tables();
        let busy = tables.assignments.values().any(|assignment| {
            assignment.courier_id == *id
                && tables.orders.iter().any(|order| {
                    order.id == assignment.order_id && !order.status.is_terminal()
                })
        });
        if busy {
            return Err(CourierRepositoryError::busy());
        }
        let before = tables.couriers.len();
        tables
            .couriers
            .retain(|courier| !(courier.id == *id && courier.organization_id == *organization_id));
        let deleted = tables.couriers.len() < before;
        if deleted {
            tables
                .assignments
                .retain(|_, assignment| assignment.courier_id != *id);
        }
        Ok(deleted)
    }
}

#[async_trait]
impl OrderRepository for InMemoryBackOffice {
    async fn list(
        &self,
        organization_id: &OrganizationId,
        filter: &OrderFilter,
        page: &PageRequest,
    ) -> Result<Vec<Order>, OrderRepositoryError> {
        let tables = self.tables();
        let mut rows: Vec<&Order> = tables
            .orders
            .iter()
            .filter(|order| order.organization_id == *organization_id)
            .filter(|order| filter.status.is_none_or(|status| order.status == status))
            .filter(|order| filter.client_id.is_none_or(|client| order.client_id == client))
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let rows = page_window(rows, page);
        Ok(rows.iter().map(|order| tables.with_assignment(order)).collect())
    }

    async fn find(
        &self,
        organization_id: &OrganizationId,
        id: &OrderId,
    ) -> Result<Option<Order>, OrderRepositoryError> {
        let tables = self.tables();
        Ok(tables
            .orders
            .iter()
            .find(|order| order.id == *id && order.organization_id == *organization_id)
            .map(|order| tables.with_assignment(order)))
    }

    async fn create(
        &self,
        order: &Order,
        reservations: &Reservations,
    ) -> Result<Vec<Product>, OrderRepositoryError> {
        let mut tables = self.tables();
        let deltas: BTreeMap<ProductId, i64> = reservations
            .iter()
            .map(|(product_id, quantity)| (*product_id, i64::from(*quantity)))
            .collect();
        let touched = tables.move_stock(&order.organization_id, &deltas)?;
        let mut stored = order.clone();
        stored.assignment = None;
        tables.orders.push(stored);
        Ok(touched)
    }

    async fn replace(
        &self,
        order: &Order,
        stock_deltas: &BTreeMap<ProductId, i64>,
    ) -> Result<Vec<Product>, OrderRepositoryError> {
        let mut tables = self.tables();
        let pending = tables.orders.iter().any(|existing| {
            existing.id == order.id
                && existing.organization_id == order.organization_id
                && existing.status == OrderStatus::Pending
        });
        if !pending {
            return Err(OrderRepositoryError::status_changed());
        }
        let touched = tables.move_stock(&order.organization_id, stock_deltas)?;
        if let Some(existing) = tables.orders.iter_mut().find(|existing| existing.id == order.id) {
            existing.client_id = order.client_id;
            existing.delivery_address.clone_from(&order.delivery_address);
            existing.notes.clone_from(&order.notes);
            existing.total = order.total;
            existing.details.clone_from(&order.details);
            existing.updated_at = order.updated_at;
        }
        Ok(touched)
    }

    async fn update_status(
        &self,
        order: &Order,
        expected: OrderStatus,
        restock: &Reservations,
    ) -> Result<(), OrderRepositoryError> {
        let mut tables = self.tables();
        let existing = tables
            .orders
            .iter_mut()
            .find(|existing| {
                existing.id == order.id
                    && existing.organization_id == order.organization_id
                    && existing.status == expected
            })
            .ok_or_else(OrderRepositoryError::status_changed)?;
        existing.status = order.status;
        existing.updated_at = order.updated_at;
        tables.restock(&order.organization_id, restock)
    }

    async fn delete(
        &self,
        organization_id: &OrganizationId,
        id: &OrderId,
        expected: OrderStatus,
        restock: &Reservations,
    ) -> Result<(), OrderRepositoryError> {
        let mut tables = self.tables();
        let index = tables
            .orders
            .iter()
            .position(|order| {
                order.id == *id && order.organization_id == *organization_id && order.status == expected
            })
            .ok_or_else(OrderRepositoryError::status_changed)?;
        tables.orders.remove(index);
        tables.assignments.remove(id);
        tables.restock(organization_id, restock)
    }

    async fn assign(&self, assignment: &OrderAssignment) -> Result<(), OrderRepositoryError> {
        self.tables()
            .assignments
            .insert(assignment.order_id, assignment.clone());
        Ok(())
    }

    async fn unassign(&self, order_id: &OrderId) -> Result<bool, OrderRepositoryError> {
        Ok(self.tables().assignments.remove(order_id).is_some())
    }

    async fn list_assignments(
        &self,
        organization_id: &OrganizationId,
        courier_id: Option<CourierId>,
    ) -> Result<Vec<OrderAssignment>, OrderRepositoryError> {
        let tables = self.tables();
        let mut rows: Vec<OrderAssignment> = tables
            .assignments
            .values()
            .filter(|assignment| {
                tables.orders.iter().any(|order| {
                    order.id == assignment.order_id && order.organization_id == *organization_id
                })
            })
            .filter(|assignment| courier_id.is_none_or(|courier| assignment.courier_id == courier))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.assigned_at
                .cmp(&a.assigned_at)
                .then(a.order_id.cmp(&b.order_id))
        });
        Ok(rows)
    }
}

#[async_trait]
impl NotificationRepository for InMemoryBackOffice {
    async fn insert(&self, notification: &Notification) -> Result<(), NotificationRepositoryError> {
        self.tables().notifications.push(notification.clone());
        Ok(())
    }

    async fn list(
        &self,
        organization_id: &OrganizationId,
        filter: NotificationFilter,
        page: &PageRequest,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        let tables = self.tables();
        let mut rows: Vec<&Notification> = tables
            .notifications
            .iter()
            .filter(|notification| notification.organization_id == *organization_id)
            .filter(|notification| !filter.unread_only || !notification.read)
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(page_window(rows, page))
    }

    async fn mark_read(
        &self,
        organization_id: &OrganizationId,
        id: &NotificationId,
    ) -> Result<Option<Notification>, NotificationRepositoryError> {
        let mut tables = self.tables();
        Ok(tables
            .notifications
            .iter_mut()
            .find(|notification| {
                notification.id == *id && notification.organization_id == *organization_id
            })
            .map(|notification| {
                notification.read = true;
                notification.clone()
            }))
    }

    async fn mark_all_read(
        &self,
        organization_id: &OrganizationId,
    ) -> Result<u64, NotificationRepositoryError> {
        let mut updated = 0_u64;
        for notification in self
            .tables()
            .notifications
            .iter_mut()
            .filter(|notification| {
                notification.organization_id == *organization_id && !notification.read
            })
        {
            notification.read = true;
            updated += 1;
        }
        Ok(updated)
    }
}
