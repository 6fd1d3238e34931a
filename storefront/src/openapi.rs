use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::{api, db};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    servers(
        (url = "/api", description = "Storefront API server")
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::users::get_current_user,
        api::handlers::users::list_users,
        api::handlers::products::list_products,
        api::handlers::products::create_product,
        api::handlers::products::get_product,
        api::handlers::products::update_product,
        api::handlers::topups::submit_topup,
        api::handlers::topups::list_my_topups,
        api::handlers::topups::list_all_topups,
        api::handlers::topups::approve_topup,
        api::handlers::topups::reject_topup,
        api::handlers::purchases::purchase_product,
        api::handlers::purchases::list_purchases,
        api::handlers::tickets::create_ticket,
        api::handlers::tickets::list_my_tickets,
        api::handlers::tickets::list_all_tickets,
        api::handlers::blog::list_blog_posts,
        api::handlers::blog::create_blog_post,
        api::handlers::blog::get_blog_post,
    ),
    components(
        schemas(
            api::models::MessageResponse,
            api::models::auth::RegisterRequest,
            api::models::auth::LoginRequest,
            api::models::auth::AuthResponse,
            api::models::users::Role,
            api::models::users::UserResponse,
            api::models::users::CurrentUser,
            api::models::products::ProductCreate,
            api::models::products::ProductUpdate,
            api::models::products::ProductResponse,
            api::models::topups::TopUpCreate,
            api::models::topups::TopUpResponse,
            api::models::topups::TopUpSubmitted,
            api::models::purchases::PurchaseResponse,
            api::models::purchases::PurchaseReceipt,
            api::models::tickets::TicketCreate,
            api::models::tickets::TicketResponse,
            api::models::blog::BlogPostCreate,
            api::models::blog::BlogPostResponse,
            db::models::topups::TopUpStatus,
            db::models::tickets::TicketStatus,
            db::models::tickets::TicketReply,
        )
    ),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "users", description = "User accounts"),
        (name = "products", description = "Product catalog"),
        (name = "topups", description = "Wallet top-up requests"),
        (name = "purchases", description = "Product purchases"),
        (name = "tickets", description = "Support tickets"),
        (name = "blog", description = "Store blog"),
    ),
    info(
        title = "Storefront API",
        version = "0.1.0",
        description = "API for accounts, wallet top-ups, the product catalog, purchases, support tickets and the blog",
    ),
)]
pub struct ApiDoc;
