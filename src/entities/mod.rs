//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod asset;
pub mod borrow_request;
pub mod budget_category;
pub mod budget_expense;
pub mod consumable_model;
pub mod contract;
pub mod maintenance_schedule;
pub mod software_license;
pub mod stock_transaction;
pub mod ticket;

// Re-export specific types to avoid conflicts
pub use asset::{
    AssetCondition, AssetStatus, Column as AssetColumn, Entity as Asset, Model as AssetModel,
};
pub use borrow_request::{
    BorrowStatus, Column as BorrowRequestColumn, Entity as BorrowRequest,
    Model as BorrowRequestModel,
};
pub use budget_category::{
    Column as BudgetCategoryColumn, Entity as BudgetCategory, Model as BudgetCategoryModel,
};
pub use budget_expense::{
    Column as BudgetExpenseColumn, Entity as BudgetExpense, Model as BudgetExpenseModel,
};
pub use consumable_model::{
    Column as ConsumableModelColumn, Entity as ConsumableModel, Model as ConsumableModelModel,
};
pub use contract::{Column as ContractColumn, Entity as Contract, Model as ContractModel};
pub use maintenance_schedule::{
    Column as MaintenanceScheduleColumn, Entity as MaintenanceSchedule,
    Model as MaintenanceScheduleModel, PmStatus,
};
pub use software_license::{
    Column as SoftwareLicenseColumn, Entity as SoftwareLicense, Model as SoftwareLicenseModel,
};
pub use stock_transaction::{
    Column as StockTransactionColumn, Entity as StockTransaction,
    Model as StockTransactionModel, StockTransactionType,
};
pub use ticket::{Column as TicketColumn, Entity as Ticket, Model as TicketModel, TicketStatus};
