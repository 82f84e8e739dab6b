//! In-process datastore.
//!
//! Every table lives behind one `tokio::sync::Mutex`, so each trait method is
//! a single critical section. That gives the same atomicity the `PostgreSQL`
//! backend gets from transactions: checkout plans while holding the lock and
//! writes only once planning has succeeded.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use bazaar_core::{
    AddressId, CartLineId, CategoryId, Email, OrderId, OrderItemId, PaymentId, ProductId, UserId,
    UserRole,
};

use super::{
    AddressStore, CartStore, CatalogStore, Datastore, OrderStore, RepositoryError, UserStore,
};
use crate::checkout::{CheckoutError, CheckoutPlan, CheckoutScope};
use crate::models::{
    Address, AddressInput, CartLine, Category, CategoryInput, MAX_LINE_QUANTITY, NewUser, Order,
    OrderDetails, OrderItem, Payment, Product, ProductInput, User,
};

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<UserId, (User, String)>,
    categories: BTreeMap<CategoryId, Category>,
    products: BTreeMap<ProductId, Product>,
    cart: BTreeMap<CartLineId, CartLine>,
    addresses: BTreeMap<AddressId, Address>,
    orders: BTreeMap<OrderId, OrderDetails>,
}

impl Tables {
    /// One sequence shared by every table; ids are never reused.
    const fn next(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn cart_line_mut(&mut self, user: UserId, product: ProductId) -> Option<&mut CartLine> {
        self.cart
            .values_mut()
            .find(|l| l.user_id == user && l.product_id == product)
    }

    fn lines_for(&self, user: UserId) -> Vec<CartLine> {
        self.cart
            .values()
            .filter(|l| l.user_id == user)
            .cloned()
            .collect()
    }

    fn latest_address(&self, user: UserId) -> Option<&Address> {
        self.addresses
            .values()
            .filter(|a| a.user_id == user)
            .max_by_key(|a| (a.created_at, a.id))
    }
}

/// `Datastore` backed by in-process maps.
#[derive(Default)]
pub struct MemoryDatastore {
    tables: Mutex<Tables>,
}

impl MemoryDatastore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryDatastore {
    async fn create_user(
        &self,
        user: &NewUser,
        password_hash: &str,
    ) -> Result<User, RepositoryError> {
        let mut t = self.tables.lock().await;
        for (existing, _) in t.users.values() {
            if existing.email == user.email {
                return Err(RepositoryError::Conflict("email already exists".to_owned()));
            }
            if existing.phone == user.phone {
                return Err(RepositoryError::Conflict("phone already exists".to_owned()));
            }
        }

        let now = Utc::now();
        let created = User {
            id: UserId::new(t.next()),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            role: user.role,
            created_at: now,
            updated_at: now,
        };
        t.users
            .insert(created.id, (created.clone(), password_hash.to_owned()));
        Ok(created)
    }

    async fn get_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.users.get(&id).map(|(u, _)| u.clone()))
    }

    async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.users.values().find(|(u, _)| &u.email == email).cloned())
    }

    async fn promote_to_admin(&self, email: &Email) -> Result<User, RepositoryError> {
        let mut t = self.tables.lock().await;
        let (user, _) = t
            .users
            .values_mut()
            .find(|(u, _)| &u.email == email)
            .ok_or(RepositoryError::NotFound)?;
        user.role = UserRole::Admin;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl CatalogStore for MemoryDatastore {
    async fn create_category(&self, input: &CategoryInput) -> Result<Category, RepositoryError> {
        let mut t = self.tables.lock().await;
        if t.categories.values().any(|c| c.slug == input.slug) {
            return Err(RepositoryError::Conflict("slug already exists".to_owned()));
        }
        let category = Category {
            id: CategoryId::new(t.next()),
            name: input.name.clone(),
            slug: input.slug.clone(),
            created_at: Utc::now(),
        };
        t.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.categories.values().cloned().collect())
    }

    async fn create_product(&self, input: &ProductInput) -> Result<Product, RepositoryError> {
        let mut t = self.tables.lock().await;
        if !t.categories.contains_key(&input.category_id) {
            return Err(RepositoryError::NotFound);
        }
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(t.next()),
            category_id: input.category_id,
            name: input.name.clone(),
            description: input.description.clone(),
            price: input.price,
            quantity: input.quantity,
            rating: input.rating,
            image: input.image.clone(),
            created_at: now,
            updated_at: now,
        };
        t.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.products.get(&id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.products.values().cloned().collect())
    }

    async fn search_products(&self, query: &str) -> Result<Vec<Product>, RepositoryError> {
        let needle = query.to_lowercase();
        let t = self.tables.lock().await;
        Ok(t.products
            .values()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn update_product(
        &self,
        id: ProductId,
        input: &ProductInput,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut t = self.tables.lock().await;
        if !t.categories.contains_key(&input.category_id) {
            return Err(RepositoryError::NotFound);
        }
        let Some(product) = t.products.get_mut(&id) else {
            return Ok(None);
        };
        product.category_id = input.category_id;
        product.name.clone_from(&input.name);
        product.description.clone_from(&input.description);
        product.price = input.price;
        product.quantity = input.quantity;
        product.rating = input.rating;
        product.image.clone_from(&input.image);
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let mut t = self.tables.lock().await;
        let ordered = t
            .orders
            .values()
            .flat_map(|o| &o.items)
            .any(|item| item.product_id == id);
        if ordered {
            return Err(RepositoryError::Conflict(
                "product is referenced by an order".to_owned(),
            ));
        }
        if t.products.remove(&id).is_none() {
            return Ok(false);
        }
        t.cart.retain(|_, line| line.product_id != id);
        Ok(true)
    }
}

#[async_trait]
impl CartStore for MemoryDatastore {
    async fn add_to_cart(
        &self,
        user: UserId,
        product: &Product,
    ) -> Result<CartLine, RepositoryError> {
        let mut t = self.tables.lock().await;
        if !t.users.contains_key(&user) || !t.products.contains_key(&product.id) {
            return Err(RepositoryError::NotFound);
        }

        let now = Utc::now();
        if let Some(line) = t.cart_line_mut(user, product.id) {
            line.quantity = line
                .quantity
                .checked_add(1)
                .filter(|q| *q <= MAX_LINE_QUANTITY)
                .ok_or(RepositoryError::QuantityLimit)?;
            line.updated_at = now;
            return Ok(line.clone());
        }

        let line = CartLine {
            id: CartLineId::new(t.next()),
            user_id: user,
            product_id: product.id,
            product_name: product.name.clone(),
            price: product.price,
            quantity: 1,
            rating: product.rating,
            image: product.image.clone(),
            created_at: now,
            updated_at: now,
        };
        t.cart.insert(line.id, line.clone());
        Ok(line)
    }

    async fn remove_from_cart(
        &self,
        user: UserId,
        product: ProductId,
    ) -> Result<bool, RepositoryError> {
        let mut t = self.tables.lock().await;
        let before = t.cart.len();
        t.cart
            .retain(|_, l| !(l.user_id == user && l.product_id == product));
        Ok(t.cart.len() < before)
    }

    async fn get_cart_items(&self, user: UserId) -> Result<Vec<CartLine>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.lines_for(user))
    }

    async fn update_quantity(
        &self,
        user: UserId,
        product: ProductId,
        quantity: i32,
    ) -> Result<Option<CartLine>, RepositoryError> {
        let mut t = self.tables.lock().await;
        Ok(t.cart_line_mut(user, product).map(|line| {
            line.quantity = quantity;
            line.updated_at = Utc::now();
            line.clone()
        }))
    }

    async fn clear_cart(&self, user: UserId) -> Result<u64, RepositoryError> {
        let mut t = self.tables.lock().await;
        let before = t.cart.len();
        t.cart.retain(|_, l| l.user_id != user);
        Ok((before - t.cart.len()) as u64)
    }
}

#[async_trait]
impl AddressStore for MemoryDatastore {
    async fn add_address(
        &self,
        user: UserId,
        input: &AddressInput,
    ) -> Result<Address, RepositoryError> {
        let mut t = self.tables.lock().await;
        if !t.users.contains_key(&user) {
            return Err(RepositoryError::NotFound);
        }
        let now = Utc::now();
        let address = Address {
            id: AddressId::new(t.next()),
            user_id: user,
            street: input.street.clone(),
            city: input.city.clone(),
            state: input.state.clone(),
            country: input.country.clone(),
            created_at: now,
            updated_at: now,
        };
        t.addresses.insert(address.id, address.clone());
        Ok(address)
    }

    async fn list_addresses(&self, user: UserId) -> Result<Vec<Address>, RepositoryError> {
        let t = self.tables.lock().await;
        let mut out: Vec<Address> = t
            .addresses
            .values()
            .filter(|a| a.user_id == user)
            .cloned()
            .collect();
        out.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(out)
    }

    async fn update_address(
        &self,
        id: AddressId,
        user: UserId,
        input: &AddressInput,
    ) -> Result<Option<Address>, RepositoryError> {
        let mut t = self.tables.lock().await;
        let Some(address) = t.addresses.get_mut(&id).filter(|a| a.user_id == user) else {
            return Ok(None);
        };
        address.street.clone_from(&input.street);
        address.city.clone_from(&input.city);
        address.state.clone_from(&input.state);
        address.country.clone_from(&input.country);
        address.updated_at = Utc::now();
        Ok(Some(address.clone()))
    }

    async fn delete_address(&self, id: AddressId, user: UserId) -> Result<bool, RepositoryError> {
        let mut t = self.tables.lock().await;
        let owned = t.addresses.get(&id).is_some_and(|a| a.user_id == user);
        if owned && t.orders.values().any(|o| o.order.address_id == id) {
            return Err(RepositoryError::Conflict(
                "address is referenced by an order".to_owned(),
            ));
        }
        if owned {
            t.addresses.remove(&id);
        }
        Ok(owned)
    }

    async fn latest_address(&self, user: UserId) -> Result<Option<Address>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.latest_address(user).cloned())
    }
}

#[async_trait]
impl OrderStore for MemoryDatastore {
    async fn place_order(
        &self,
        user: UserId,
        scope: CheckoutScope,
    ) -> Result<OrderDetails, CheckoutError> {
        let mut t = self.tables.lock().await;

        let lines = match scope {
            CheckoutScope::WholeCart => t.lines_for(user),
            CheckoutScope::SingleLine(product) => {
                let line = t
                    .lines_for(user)
                    .into_iter()
                    .find(|l| l.product_id == product)
                    .ok_or(CheckoutError::LineNotFound(product))?;
                vec![line]
            }
        };
        let plan = CheckoutPlan::build(user, &lines, t.latest_address(user))?;

        let now = Utc::now();
        let order_id = OrderId::new(t.next());
        let order = Order {
            id: order_id,
            user_id: plan.user_id,
            address_id: plan.address_id,
            total_price: plan.total,
            status: plan.status,
            payment_method: plan.payment_method,
            created_at: now,
        };
        let items = plan
            .items
            .iter()
            .map(|item| OrderItem {
                id: OrderItemId::new(t.next()),
                order_id,
                product_id: item.product_id,
                quantity: item.quantity,
                price: item.price,
            })
            .collect();
        let payment = Payment {
            id: PaymentId::new(t.next()),
            order_id,
            amount: plan.total,
            payment_method: plan.payment_method,
            created_at: now,
        };
        for id in &plan.consumed {
            t.cart.remove(id);
        }

        let details = OrderDetails {
            order,
            items,
            payment,
        };
        t.orders.insert(order_id, details.clone());
        Ok(details)
    }

    async fn list_orders(&self, user: UserId) -> Result<Vec<OrderDetails>, RepositoryError> {
        let t = self.tables.lock().await;
        Ok(t.orders
            .values()
            .rev()
            .filter(|o| o.order.user_id == user)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl Datastore for MemoryDatastore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}
