/// Answers whether this application is the platform's default SMS handler.
pub trait PlatformIdentity {
    fn package_name(&self) -> Option<String>;
    fn default_handler_package(&self) -> Option<String>;

    fn is_default_handler(&self) -> bool {
        match (self.package_name(), self.default_handler_package()) {
            (Some(pkg), Some(default_pkg)) => pkg == default_pkg,
            _ => false,
        }
    }
}

/// Identity taken from configuration.
#[derive(Clone, Debug, Default)]
pub struct ConfiguredIdentity {
    pub package_name: Option<String>,
    pub default_sms_package: Option<String>,
}

impl PlatformIdentity for ConfiguredIdentity {
    fn package_name(&self) -> Option<String> {
        self.package_name.clone()
    }

    fn default_handler_package(&self) -> Option<String> {
        self.default_sms_package.clone()
    }
}
