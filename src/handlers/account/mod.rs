// Account endpoints: token acquisition, signup, current-user lookup.
pub mod login;
pub mod me;
pub mod refresh;
pub mod signup;

pub use login::login;
pub use me::me;
pub use refresh::refresh;
pub use signup::signup;
