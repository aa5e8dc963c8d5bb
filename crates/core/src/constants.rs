/// Constants used throughout the rivet codebase
// Environment variable names
pub const RIVET_LOG_VAR: &str = "RIVET_LOG";
pub const RIVET_CONTINUE_VAR: &str = "RIVET_CONTINUE";
pub const RIVET_SKIP_VAR: &str = "RIVET_SKIP";

// Parameter list splitting
pub const DEFAULT_LIST_SEPARATOR: char = ',';

// Replacement text for secret parameter values
pub const SECRET_MASK: &str = "*****";

// Process exit codes
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;
pub const EXIT_CONFIGURATION_ERROR: i32 = 2;
pub const EXIT_USER_CANCELLED: i32 = 130;
