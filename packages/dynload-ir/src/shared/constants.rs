//! Centralized constants
//!
//! Well-known JVM names the analysis matches on, plus thread pool tuning.

/// Well-known JVM type and member names
pub mod jvm {
    pub const JAVA_LANG_OBJECT: &str = "java.lang.Object";
    pub const JAVA_LANG_STRING: &str = "java.lang.String";
    pub const JAVA_LANG_CLASS: &str = "java.lang.Class";
    pub const JAVA_LANG_CHAR_SEQUENCE: &str = "java.lang.CharSequence";
    pub const JAVA_LANG_STRING_BUILDER: &str = "java.lang.StringBuilder";
    pub const JAVA_LANG_STRING_BUFFER: &str = "java.lang.StringBuffer";
    pub const JAVA_UTIL_SERVICE_LOADER: &str = "java.util.ServiceLoader";

    /// Instance initializer
    pub const INIT: &str = "<init>";

    /// Static initializer
    pub const CLINIT: &str = "<clinit>";

    pub const LOAD: &str = "load";
    pub const FOR_NAME: &str = "forName";
    pub const CANONICAL_NAME: &str = "getCanonicalName";
    pub const SIMPLE_NAME: &str = "getSimpleName";
    pub const APPEND: &str = "append";
    pub const CONCAT: &str = "concat";
    pub const TO_STRING: &str = "toString";
}

/// Thread pool configuration
pub mod thread_pool {
    /// Percentage of available CPU cores to use for the batch thread pool
    pub const CPU_UTILIZATION_PERCENT: f64 = 0.75;

    /// Minimum number of threads (always use at least 1)
    pub const MIN_THREADS: usize = 1;
}
