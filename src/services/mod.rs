//! Business logic layer
//!
//! Services own the marketplace rules (ownership, validation, duplicate
//! guards, notifications) and talk to the database only through the
//! repository traits.

pub mod application;
pub mod contract;
pub mod favorite;
pub mod message;
pub mod notification;
pub mod passport;
pub mod password;
pub mod property;
pub mod user;
pub mod visit;

pub use application::{ApplicationService, ApplicationServiceError};
pub use contract::{ContractService, ContractServiceError};
pub use favorite::{FavoriteService, FavoriteServiceError};
pub use message::{MessageService, MessageServiceError};
pub use notification::{NotificationService, NotificationServiceError};
pub use passport::{PassportService, PassportServiceError};
pub use password::{hash_password, verify_password};
pub use property::{PropertyService, PropertyServiceError};
pub use user::{LoginInput, RegisterInput, UserService, UserServiceError};
pub use visit::{VisitService, VisitServiceError};
