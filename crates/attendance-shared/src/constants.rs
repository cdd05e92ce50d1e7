/// Username of the account seeded on first start
pub const BOOTSTRAP_ADMIN_USERNAME: &str = "admin";

/// Password of the account seeded on first start. Change it after deploying.
pub const BOOTSTRAP_ADMIN_PASSWORD: &str = "admin123";

/// Default timezone stored on the settings row
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Wall-clock format used by `in_time` / `out_time`
pub const WALL_CLOCK_FORMAT: &str = "%H:%M";

/// Default HTTP API port
pub const DEFAULT_HTTP_PORT: u16 = 8000;

/// Maximum accepted photo size in bytes (10 MiB)
pub const MAX_PHOTO_SIZE: usize = 10 * 1024 * 1024;

/// Directory (relative to the working directory) holding uploaded photos
pub const UPLOAD_DIR: &str = "uploads";
