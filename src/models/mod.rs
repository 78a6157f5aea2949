//! Domain models shared by repositories, services and the API layer.

pub mod application;
pub mod audit;
pub mod contract;
pub mod favorite;
pub mod message;
pub mod notification;
pub mod passport;
pub mod property;
pub mod session;
pub mod user;
pub mod visit;

pub use application::{Application, ApplicationStatus, ApplicationWithDetails};
pub use audit::AuditEntry;
pub use contract::{Contract, ContractStatus, ContractWithDetails, CreateContractInput};
pub use favorite::{Favorite, FavoriteWithProperty};
pub use message::{ConversationSummary, Message};
pub use notification::{Notification, NotificationKind};
pub use passport::{DocumentKind, Passport, PassportDocument};
pub use property::{
    CreatePropertyInput, Operation, Property, PropertyFilter, PropertySort, PropertyStatus,
    PropertyType, PropertyWithOwner, UpdatePropertyInput,
};
pub use session::Session;
pub use user::{CreateUserInput, UpdateUserInput, User, UserRole};
pub use visit::{Visit, VisitStatus, VisitWithDetails};
