//! Compiled permission requirements for known remote tools.
//!
//! The remote catalog evolves independently of this table, so it is known to
//! be incomplete. Rows are maintained by hand alongside the server's tool list.

use toolkit_config::Permission;

/// A `(resource category, permission)` pair a tool requires.
pub type ToolPermission = (&'static str, Permission);

/// Tool name to required permissions.
pub const TOOL_PERMISSIONS: &[(&str, &[ToolPermission])] = &[
    ("create_customer", &[("customers", Permission::Create)]),
    ("list_customers", &[("customers", Permission::Read)]),
    ("create_product", &[("products", Permission::Create)]),
    ("list_products", &[("products", Permission::Read)]),
    ("create_price", &[("prices", Permission::Create)]),
    ("list_prices", &[("prices", Permission::Read)]),
    ("create_payment_link", &[("paymentLinks", Permission::Create)]),
    ("create_invoice", &[("invoices", Permission::Create)]),
    ("list_invoices", &[("invoices", Permission::Read)]),
    ("finalize_invoice", &[("invoices", Permission::Update)]),
    ("create_invoice_item", &[("invoiceItems", Permission::Create)]),
    ("retrieve_balance", &[("balance", Permission::Read)]),
    ("create_refund", &[("refunds", Permission::Create)]),
    ("list_payment_intents", &[("paymentIntents", Permission::Read)]),
    ("list_subscriptions", &[("subscriptions", Permission::Read)]),
    ("cancel_subscription", &[("subscriptions", Permission::Update)]),
    ("update_subscription", &[("subscriptions", Permission::Update)]),
    ("list_coupons", &[("coupons", Permission::Read)]),
    ("create_coupon", &[("coupons", Permission::Create)]),
    ("list_disputes", &[("disputes", Permission::Read)]),
    ("update_dispute", &[("disputes", Permission::Update)]),
    ("search_documentation", &[("documentation", Permission::Read)]),
];

/// Returns the permissions `tool` requires, or `None` for tools not in the table.
#[must_use]
pub fn required_permissions(tool: &str) -> Option<&'static [ToolPermission]> {
    TOOL_PERMISSIONS
        .iter()
        .find(|(name, _)| *name == tool)
        .map(|(_, required)| *required)
}
