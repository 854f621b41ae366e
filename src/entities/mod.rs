pub mod customer;
pub mod customer_group;
pub mod customer_group_member;
pub mod order;
pub mod order_item;
pub mod order_number_counter;
pub mod product;
pub mod stock_alert;
pub mod stock_movement;
pub mod wholesaler;
pub mod wholesaler_customer;
