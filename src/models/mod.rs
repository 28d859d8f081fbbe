pub mod ingredient;
pub mod membership;
pub mod recipe;
pub mod recipe_ingredient;
pub mod recipe_tags;
pub mod subscription;
pub mod tag;
pub mod user;

pub use membership::ListKind;
pub use recipe::RecipeShort;
