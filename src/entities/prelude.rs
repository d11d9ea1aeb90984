pub use super::auth_users::Entity as AuthUsers;
pub use super::order_images::Entity as OrderImages;
pub use super::order_moves::Entity as OrderMoves;
pub use super::orders::Entity as Orders;
