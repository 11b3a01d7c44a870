pub mod risk_assessment;
pub mod site;
pub mod user;
pub mod vendor;

pub use risk_assessment::RiskAssessment;
pub use site::{NewSite, Site, SiteDetail};
pub use user::{Department, Function, NewUser, Role, User, UserProfile};
pub use vendor::{NewVendor, Vendor};
