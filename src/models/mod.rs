pub mod organization;
pub mod property;
pub mod question;
pub mod question_bank_question;
pub mod survey;
pub mod user;

pub use organization::*;
pub use property::*;
pub use question::*;
pub use question_bank_question::*;
pub use survey::*;
pub use user::*;
