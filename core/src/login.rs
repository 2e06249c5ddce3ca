use std::fmt;

/// A `user[:password]` pair as found in URI user info.
#[derive(Clone, PartialEq, Eq)]
pub struct Login {
    user: String,
    password: Option<String>,
}

impl Login {
    pub fn new(user: impl Into<String>, password: Option<String>) -> Self {
        Self {
            user: user.into(),
            password,
        }
    }

    /// Splits at the first `:`. Blank input has no login at all.
    pub fn parse(user_and_pwd: &str) -> Option<Self> {
        if user_and_pwd.trim().is_empty() {
            return None;
        }
        Some(match user_and_pwd.split_once(':') {
            Some((user, pwd)) => Self::new(user, Some(pwd.to_string())),
            None => Self::new(user_and_pwd, None),
        })
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }
}

impl fmt::Display for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.user)?;
        if self.password.is_some() {
            f.write_str(":*******")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Login({self})")
    }
}
