use crate::api;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::recipe::add_favorite,
        api::recipe::remove_favorite,
        api::recipe::add_to_cart,
        api::recipe::remove_from_cart,
        api::recipe::download_shopping_cart,
        api::user::subscribe,
        api::user::unsubscribe,
    ),
    tags(
        (name = "foodgram", description = "Foodgram recipe API")
    )
)]
pub struct ApiDoc;
