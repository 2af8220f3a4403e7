use secrecy::SecretString;

pub mod session;

#[derive(Debug)]
pub enum Action {
    Decode {
        token: SecretString,
    },
    SignIn {
        email: String,
        password: SecretString,
        human_key: Option<String>,
    },
    Status,
    CheckRole {
        role: String,
    },
    SignOut,
}
