use std::io::{BufRead, Write};

use tracing::info;

use super::{Console, ConsoleError, RULE_WIDE, WALK_IN_CUSTOMER};
use crate::catalog::CatalogStore;
use crate::domain::aggregates::{ItemAdjustment, Order, OrderError};

enum Edit {
    Increase,
    Decrease,
}

impl<R: BufRead, W: Write, S: CatalogStore> Console<R, W, S> {
    pub(super) fn customer_session(&mut self) -> Result<(), ConsoleError> {
        writeln!(self.output, "\n🛒 PLACE AN ORDER")?;
        loop {
            self.show_menu()?;
            writeln!(self.output, "\nOptions:")?;
            writeln!(self.output, "1. Add product to order")?;
            writeln!(self.output, "2. View current order")?;
            writeln!(self.output, "3. Edit order")?;
            writeln!(self.output, "4. Checkout")?;
            writeln!(self.output, "5. Cancel order")?;
            writeln!(self.output, "0. Back to main menu")?;

            let step = match self.prompt("\nSelect an option: ")?.as_str() {
                "1" => self.add_to_order().map(|()| false),
                "2" => self.show_order().map(|()| false),
                "3" => self.edit_order().map(|()| false),
                "4" => self.checkout(),
                "5" => self.cancel_order(),
                "0" => return Ok(()),
                _ => {
                    writeln!(self.output, "❌ Invalid option")?;
                    continue;
                }
            };
            if self.report(step)?.unwrap_or(false) { return Ok(()); }
        }
    }

    fn add_to_order(&mut self) -> Result<(), ConsoleError> {
        let position: usize = self.prompt_parse("\nEnter the product ID: ")?;
        let product = self.catalog.by_position(position)?;
        if !product.is_available() {
            return Err(OrderError::ProductUnavailable(product.name().to_string()).into());
        }
        writeln!(self.output, "Selected: {} - {}", product.name(), product.price())?;

        let quantity: i64 = self.prompt_parse("Quantity: ")?;
        let quantity = u32::try_from(quantity).ok().filter(|q| *q > 0).ok_or(OrderError::InvalidQuantity)?;
        let product = self.catalog.by_position(position)?;
        self.order.add_item(product, quantity)?;
        writeln!(self.output, "✅ {quantity} x {} added to the order", product.name())?;
        Ok(())
    }

    fn show_order(&mut self) -> Result<(), ConsoleError> {
        if self.order.is_empty() {
            writeln!(self.output, "\n📝 Your order is empty")?;
            return Ok(());
        }
        writeln!(self.output, "\n{RULE_WIDE}")?;
        writeln!(self.output, "               YOUR CURRENT ORDER")?;
        writeln!(self.output, "{RULE_WIDE}")?;
        for (i, item) in self.order.items().iter().enumerate() {
            writeln!(self.output, "{}. {}", i + 1, item.name())?;
            writeln!(self.output, "   Quantity: {} x {} = {}", item.quantity(), item.unit_price(), item.subtotal())?;
        }
        writeln!(self.output, "TOTAL: {}", self.order.total())?;
        writeln!(self.output, "{RULE_WIDE}")?;
        Ok(())
    }

    fn edit_order(&mut self) -> Result<(), ConsoleError> {
        if self.order.is_empty() {
            writeln!(self.output, "\n📝 There are no products in the order")?;
            return Ok(());
        }
        while !self.order.is_empty() {
            self.show_order()?;
            writeln!(self.output, "\nEdit options:")?;
            writeln!(self.output, "1. Add more of a product")?;
            writeln!(self.output, "2. Reduce quantity of a product")?;
            writeln!(self.output, "3. Remove product from order")?;
            writeln!(self.output, "0. Back")?;

            let step = match self.prompt("\nSelect an option: ")?.as_str() {
                "1" => self.change_item_quantity(Edit::Increase),
                "2" => self.change_item_quantity(Edit::Decrease),
                "3" => self.remove_from_order(),
                "0" => return Ok(()),
                _ => {
                    writeln!(self.output, "❌ Invalid option")?;
                    continue;
                }
            };
            self.report(step)?;
        }
        Ok(())
    }

    fn pick_item(&mut self, label: &str) -> Result<String, ConsoleError> {
        let position: usize = self.prompt_parse(label)?;
        position.checked_sub(1)
            .and_then(|idx| self.order.items().get(idx))
            .map(|item| item.id().to_string())
            .ok_or_else(|| OrderError::ItemNotFound(format!("#{position}")).into())
    }

    fn change_item_quantity(&mut self, edit: Edit) -> Result<(), ConsoleError> {
        let item_id = self.pick_item("Enter the item number: ")?;
        let label = match edit { Edit::Increase => "Quantity to add: ", Edit::Decrease => "Quantity to remove: " };
        let amount: i64 = self.prompt_parse(label)?;
        if amount <= 0 { return Err(OrderError::InvalidQuantity.into()); }
        let delta = match edit { Edit::Increase => amount, Edit::Decrease => -amount };

        match self.order.adjust_item(&item_id, delta, &self.catalog)? {
            ItemAdjustment::Updated { quantity } => writeln!(self.output, "✅ Quantity is now {quantity}")?,
            ItemAdjustment::Removed => writeln!(self.output, "✅ Product removed from the order")?,
        }
        Ok(())
    }

    fn remove_from_order(&mut self) -> Result<(), ConsoleError> {
        let item_id = self.pick_item("Enter the number of the item to remove: ")?;
        let removed = self.order.remove_item(&item_id)?;
        writeln!(self.output, "✅ {} removed from the order", removed.name())?;
        Ok(())
    }

    /// Returns `true` once the order has been confirmed.
    fn checkout(&mut self) -> Result<bool, ConsoleError> {
        if self.order.is_empty() { return Err(OrderError::NoItems.into()); }

        writeln!(self.output, "\n{RULE_WIDE}")?;
        writeln!(self.output, "                 ORDER SUMMARY")?;
        writeln!(self.output, "{RULE_WIDE}")?;
        for item in self.order.items() {
            writeln!(self.output, "{}", item.name())?;
            writeln!(self.output, "  Quantity: {} x {} = {}", item.quantity(), item.unit_price(), item.subtotal())?;
        }
        writeln!(self.output, "TOTAL TO PAY: {}", self.order.total())?;
        writeln!(self.output, "{RULE_WIDE}")?;

        if !self.prompt_yes("\nConfirm order? (y/n): ")? {
            writeln!(self.output, "❌ Order not confirmed")?;
            return Ok(false);
        }

        self.order.confirm(&mut self.catalog)?;
        let fresh = Order::create(WALK_IN_CUSTOMER, self.catalog.currency());
        let confirmed = std::mem::replace(&mut self.order, fresh);
        self.store.save(&self.catalog)?;
        info!(order_id = confirmed.id(), total = %confirmed.total().amount(), items = confirmed.items().len(), "order confirmed");

        writeln!(self.output, "✅ Order confirmed! Thank you for your purchase")?;
        self.prompt("\nPress Enter to continue...")?;
        Ok(true)
    }

    /// Returns `true` once the order has been cancelled.
    fn cancel_order(&mut self) -> Result<bool, ConsoleError> {
        if self.order.is_empty() {
            writeln!(self.output, "\n📝 There is no order to cancel")?;
            return Ok(false);
        }
        if !self.prompt_yes("\nAre you sure you want to cancel the order? (y/n): ")? {
            writeln!(self.output, "❌ Cancellation aborted")?;
            return Ok(false);
        }
        self.order.cancel()?;
        self.order = Order::create(WALK_IN_CUSTOMER, self.catalog.currency());
        writeln!(self.output, "✅ Order cancelled")?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{console, transcript};
    use crate::catalog::from_json;
    use crate::domain::aggregates::OrderStatus;
    use rust_decimal::Decimal;

    // Espresso is product 5 on the default menu.

    #[test]
    fn test_order_and_checkout_decrements_and_saves() {
        let mut c = console("1\n1\n5\n2\n4\ny\n\n0\n");
        c.run().unwrap();
        assert_eq!(c.catalog().get("Espresso").unwrap().stock(), 58);
        let saved = from_json(&c.store().contents().unwrap(), "COP").unwrap();
        assert_eq!(saved.get("Espresso").unwrap().stock(), 58);
        assert!(c.order().is_empty());
        let out = transcript(&c);
        assert!(out.contains("TOTAL TO PAY: $6,000"));
        assert!(out.contains("Order confirmed"));
    }

    #[test]
    fn test_checkout_empty_order_is_reported() {
        let mut c = console("1\n4\n0\n0\n");
        c.run().unwrap();
        assert!(transcript(&c).contains("❌ No items in the order"));
        assert_eq!(c.order().status(), OrderStatus::Pending);
        assert!(c.store().contents().is_none());
    }

    #[test]
    fn test_invalid_input_does_not_break_loop() {
        let mut c = console("1\n1\nabc\n1\n99\n1\n5\n0\n1\n5\n61\n0\n0\n");
        c.run().unwrap();
        let out = transcript(&c);
        assert!(out.contains("❌ Please enter valid numbers"));
        assert!(out.contains("❌ No product with ID 99"));
        assert!(out.contains("❌ Quantity must be greater than 0"));
        assert!(out.contains("Only 60 units of Espresso available"));
        assert!(c.order().is_empty());
    }

    #[test]
    fn test_declined_checkout_keeps_order() {
        let mut c = console("1\n1\n4\n3\n4\nn\n0\n0\n");
        c.run().unwrap();
        assert_eq!(c.order().items().len(), 1);
        assert_eq!(c.order().total().amount(), Decimal::from(15000));
        assert_eq!(c.catalog().get("Latte").unwrap().stock(), 25);
    }

    #[test]
    fn test_edit_order() {
        // add 2 Latte, +1, -2, then remove it entirely
        let mut c = console("1\n1\n4\n2\n3\n1\n1\n1\n2\n1\n2\n3\n1\n0\n0\n");
        c.run().unwrap();
        let out = transcript(&c);
        assert!(out.contains("Quantity is now 3"));
        assert!(out.contains("Quantity is now 1"));
        assert!(out.contains("Latte removed from the order"));
        assert!(c.order().is_empty());
    }

    #[test]
    fn test_cancel_order() {
        let mut c = console("1\n1\n8\n1\n5\ny\n0\n");
        c.run().unwrap();
        assert!(transcript(&c).contains("Order cancelled"));
        assert!(c.order().is_empty());
        assert_eq!(c.catalog().get("Croissant").unwrap().stock(), 30);
    }
}
