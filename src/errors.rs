use std::fmt;

use actix_web::http::StatusCode;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceError {
    InvalidInput(String),
    OutOfRange(String),
    FutureDate(String),
    NotFound(String),
    StoreUnavailable(String),
    Internal(String),
    DatabaseConfig(String),
    DatabaseConnection(String),
    DatabaseOperation(String),
    FileOperation(String),
}

impl PresenceError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            PresenceError::InvalidInput(_) => "E001",
            PresenceError::OutOfRange(_) => "E002",
            PresenceError::FutureDate(_) => "E003",
            PresenceError::NotFound(_) => "E004",
            PresenceError::StoreUnavailable(_) => "E005",
            PresenceError::Internal(_) => "E006",
            PresenceError::DatabaseConfig(_) => "E007",
            PresenceError::DatabaseConnection(_) => "E008",
            PresenceError::DatabaseOperation(_) => "E009",
            PresenceError::FileOperation(_) => "E010",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            PresenceError::InvalidInput(_) => "Invalid Input",
            PresenceError::OutOfRange(_) => "Value Out Of Range",
            PresenceError::FutureDate(_) => "Future Date",
            PresenceError::NotFound(_) => "Resource Not Found",
            PresenceError::StoreUnavailable(_) => "Store Unavailable",
            PresenceError::Internal(_) => "Internal Error",
            PresenceError::DatabaseConfig(_) => "Database Configuration Error",
            PresenceError::DatabaseConnection(_) => "Database Connection Error",
            PresenceError::DatabaseOperation(_) => "Database Operation Error",
            PresenceError::FileOperation(_) => "File Operation Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            PresenceError::InvalidInput(msg)
            | PresenceError::OutOfRange(msg)
            | PresenceError::FutureDate(msg)
            | PresenceError::NotFound(msg)
            | PresenceError::StoreUnavailable(msg)
            | PresenceError::Internal(msg)
            | PresenceError::DatabaseConfig(msg)
            | PresenceError::DatabaseConnection(msg)
            | PresenceError::DatabaseOperation(msg)
            | PresenceError::FileOperation(msg) => msg,
        }
    }

    /// 客户端错误：参数缺失、越界、未来日期、记录不存在
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PresenceError::InvalidInput(_)
                | PresenceError::OutOfRange(_)
                | PresenceError::FutureDate(_)
                | PresenceError::NotFound(_)
        )
    }

    /// HTTP 状态码映射
    pub fn http_status(&self) -> StatusCode {
        match self {
            PresenceError::InvalidInput(_)
            | PresenceError::OutOfRange(_)
            | PresenceError::FutureDate(_) => StatusCode::BAD_REQUEST,
            PresenceError::NotFound(_) => StatusCode::NOT_FOUND,
            PresenceError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 格式化为彩色输出（用于 Server 模式）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出（用于 CLI 模式）
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for PresenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for PresenceError {}

// 便捷的构造函数
impl PresenceError {
    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        PresenceError::InvalidInput(msg.into())
    }

    pub fn out_of_range<T: Into<String>>(msg: T) -> Self {
        PresenceError::OutOfRange(msg.into())
    }

    pub fn future_date<T: Into<String>>(msg: T) -> Self {
        PresenceError::FutureDate(msg.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        PresenceError::NotFound(msg.into())
    }

    pub fn store_unavailable<T: Into<String>>(msg: T) -> Self {
        PresenceError::StoreUnavailable(msg.into())
    }

    pub fn internal<T: Into<String>>(msg: T) -> Self {
        PresenceError::Internal(msg.into())
    }

    pub fn database_config<T: Into<String>>(msg: T) -> Self {
        PresenceError::DatabaseConfig(msg.into())
    }

    pub fn database_connection<T: Into<String>>(msg: T) -> Self {
        PresenceError::DatabaseConnection(msg.into())
    }

    pub fn database_operation<T: Into<String>>(msg: T) -> Self {
        PresenceError::DatabaseOperation(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        PresenceError::FileOperation(msg.into())
    }
}

// 连接类错误转为 StoreUnavailable，由 BackendSelector 负责切换到内存存储
impl From<sea_orm::DbErr> for PresenceError {
    fn from(err: sea_orm::DbErr) -> Self {
        if crate::storage::backend::retry::is_connectivity_error(&err) {
            PresenceError::StoreUnavailable(err.to_string())
        } else {
            PresenceError::DatabaseOperation(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, PresenceError>;
