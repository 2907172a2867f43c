//! Test helpers for inbound HTTP components.

use std::sync::Arc;
use std::time::Duration;

use actix_web::body::MessageBody;
use actix_web::dev::ServiceResponse;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{test, web};
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::domain::ports::{
    BotNotifier, MarketplaceClients, MockAnalyticsRepository, MockCartRepository,
    MockCatalogRepository, MockFavoritesRepository, MockInventoryRepository,
    MockMarketplaceRepository, MockOrderRepository, MockPricingRepository, MockPurchaseRepository,
    MockUserRepository,
};
use crate::domain::{
    AdminPolicy, AnalyticsService, AuthService, BotUpdateHandler, CartService, DeliveryType,
    FavoritesService, InitDataVerifier, InventoryItem, Language, MarketplaceSyncService, Order,
    OrderId, OrderItem, OrderNotifier, OrderService, OrderStatus, PaymentMethod, Product, User,
    UserId, sign_init_data,
};
use crate::inbound::http::state::{SellerState, StoreState};
use crate::test_support::{FixedClock, RecordingNotifier};

pub const TOKEN: &str = "42:test-token";

pub fn now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_default()
}

/// `initData` for `telegram_id`, signed with [`TOKEN`] at [`now`].
pub fn signed_init_data(telegram_id: i64) -> String {
    let auth_date = now().timestamp().to_string();
    let user = format!(r#"{{"id":{telegram_id},"first_name":"Dilnoza","language_code":"ru"}}"#);
    sign_init_data(
        &[("auth_date", auth_date.as_str()), ("user", user.as_str())],
        TOKEN,
    )
    .expect("sign init data")
}

/// `Authorization` header authenticating `telegram_id`.
pub fn auth_header(telegram_id: i64) -> (actix_web::http::header::HeaderName, String) {
    (AUTHORIZATION, format!("tma {}", signed_init_data(telegram_id)))
}

pub fn auth_service(users: MockUserRepository) -> AuthService {
    AuthService::new(
        InitDataVerifier::new(TOKEN, Duration::from_secs(3600)),
        Arc::new(users),
        AdminPolicy::default(),
        Arc::new(FixedClock::new(now())),
    )
}

pub fn auth_data(users: MockUserRepository) -> web::Data<AuthService> {
    web::Data::new(auth_service(users))
}

/// Users repository that authenticates every caller as `user`.
pub fn users_returning(user: User) -> MockUserRepository {
    let mut users = MockUserRepository::new();
    users
        .expect_upsert_from_telegram()
        .returning(move |_| Ok(user.clone()));
    users
}

pub fn customer(id: i64) -> User {
    User {
        id,
        telegram_id: 1000 + id,
        first_name: "Dilnoza".to_owned(),
        last_name: None,
        username: Some("dilnoza".to_owned()),
        phone: None,
        language: Language::Ru,
        is_admin: false,
        created_at: now(),
    }
}

pub fn admin(id: i64) -> User {
    User {
        is_admin: true,
        ..customer(id)
    }
}

pub fn product(id: i64) -> Product {
    Product {
        id,
        sku: format!("SKU-{id}"),
        name_ru: format!("Товар {id}"),
        name_uz: format!("Mahsulot {id}"),
        description_ru: None,
        description_uz: None,
        price: 10_000,
        sale_price: None,
        category_id: Some(1),
        image_url: None,
        is_active: true,
        created_at: now(),
        updated_at: now(),
    }
}

/// Read a response body as JSON.
pub async fn json_body<B>(response: ServiceResponse<B>) -> Value
where
    B: MessageBody,
{
    let body = test::read_body(response).await;
    serde_json::from_slice(&body).expect("JSON body")
}

/// Inventory row with no reservations and the default threshold.
pub fn inventory_item(product_id: i64, quantity: i32) -> InventoryItem {
    InventoryItem {
        product_id,
        sku: format!("SKU-{product_id}"),
        name: format!("Товар {product_id}"),
        quantity,
        reserved: 0,
        low_stock_threshold: 5,
        updated_at: now(),
    }
}

/// Pickup order paid in cash with one line of [`product`] `1`.
pub fn order(id: OrderId, user_id: UserId, status: OrderStatus) -> Order {
    let item = product(1);
    Order {
        id,
        user_id,
        status,
        total_amount: item.price * 2,
        phone: "+998901234567".to_owned(),
        address: None,
        comment: None,
        delivery_type: DeliveryType::Pickup,
        payment_method: PaymentMethod::Cash,
        items: vec![OrderItem {
            product_id: item.id,
            sku: item.sku,
            name_ru: item.name_ru,
            name_uz: item.name_uz,
            quantity: 2,
            unit_price: item.price,
            line_total: item.price * 2,
        }],
        created_at: now(),
        updated_at: now(),
    }
}

/// Store-side ports; unset mocks fail any unexpected call.
#[derive(Default)]
pub struct StorePorts {
    pub catalog: MockCatalogRepository,
    pub users: MockUserRepository,
    pub cart: MockCartRepository,
    pub favorites: MockFavoritesRepository,
    pub orders: MockOrderRepository,
}

impl StorePorts {
    pub fn into_state(self) -> web::Data<StoreState> {
        self.into_state_with(Arc::new(RecordingNotifier::default()), None)
    }

    pub fn into_state_with(
        self,
        bot: Arc<dyn BotNotifier>,
        webhook_secret: Option<String>,
    ) -> web::Data<StoreState> {
        let catalog = Arc::new(self.catalog);
        let users = Arc::new(self.users);
        web::Data::new(StoreState {
            catalog: catalog.clone(),
            users: users.clone(),
            cart: CartService::new(catalog.clone(), Arc::new(self.cart)),
            favorites: FavoritesService::new(catalog, Arc::new(self.favorites)),
            orders: OrderService::new(
                Arc::new(self.orders),
                users,
                OrderNotifier::new(bot.clone(), None),
            ),
            bot: BotUpdateHandler::new(bot, None),
            webhook_secret,
        })
    }
}

/// Seller-side ports; sync runs without marketplace credentials.
#[derive(Default)]
pub struct SellerPorts {
    pub catalog: MockCatalogRepository,
    pub inventory: MockInventoryRepository,
    pub purchases: MockPurchaseRepository,
    pub marketplaces: MockMarketplaceRepository,
    pub pricing: MockPricingRepository,
    pub analytics: MockAnalyticsRepository,
}

impl SellerPorts {
    pub fn into_state(self) -> web::Data<SellerState> {
        let clock = Arc::new(FixedClock::new(now()));
        let marketplaces = Arc::new(self.marketplaces);
        let pricing = Arc::new(self.pricing);
        web::Data::new(SellerState {
            catalog: Arc::new(self.catalog),
            inventory: Arc::new(self.inventory),
            purchases: Arc::new(self.purchases),
            marketplaces: marketplaces.clone(),
            pricing: pricing.clone(),
            sync: MarketplaceSyncService::new(
                marketplaces,
                pricing,
                MarketplaceClients::new(),
                clock.clone(),
            ),
            analytics: AnalyticsService::new(Arc::new(self.analytics), clock),
        })
    }
}
