pub mod component_assignment;
pub mod delivery_document;
pub mod delivery_line;
pub mod document_counter;
pub mod general_stock;
pub mod stock_movement;
pub mod technical_stock;
