//! Bot messages sent to customers and the admin chat.
//!
//! Text is rendered in Telegram's HTML parse mode, so every interpolated
//! value is escaped.

use super::Language;
use super::order::{DeliveryType, Order, OrderStatus, PaymentMethod};
use super::user::User;

/// Inline keyboard button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub text: String,
    pub action: ButtonAction,
}

/// What pressing a button does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    /// Open the Mini-App at this URL.
    WebApp(String),
    /// Open an ordinary link.
    Url(String),
}

/// Rows of inline buttons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    /// Single button opening the Mini-App.
    pub fn web_app(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            rows: vec![vec![InlineButton {
                text: text.into(),
                action: ButtonAction::WebApp(url.into()),
            }]],
        }
    }
}

/// Message queued for delivery through the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub chat_id: i64,
    pub text: String,
    pub keyboard: Option<InlineKeyboard>,
}

impl OutgoingMessage {
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: InlineKeyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}

/// Escape `&`, `<` and `>` for Telegram HTML.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Group thousands with spaces and append the currency: `125 000 сум`.
pub fn format_sum(amount: i64, language: Language) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(digit);
    }
    let sign = if amount < 0 { "-" } else { "" };
    format!("{sign}{grouped} {}", language.pick("сум", "so'm"))
}

fn status_label(status: OrderStatus, language: Language) -> &'static str {
    match (status, language) {
        (OrderStatus::New, Language::Ru) => "Новый",
        (OrderStatus::New, Language::Uz) => "Yangi",
        (OrderStatus::Processing, Language::Ru) => "В обработке",
        (OrderStatus::Processing, Language::Uz) => "Jarayonda",
        (OrderStatus::Ready, Language::Ru) => "Готов к выдаче",
        (OrderStatus::Ready, Language::Uz) => "Tayyor",
        (OrderStatus::Delivered, Language::Ru) => "Доставлен",
        (OrderStatus::Delivered, Language::Uz) => "Yetkazildi",
        (OrderStatus::Cancelled, Language::Ru) => "Отменён",
        (OrderStatus::Cancelled, Language::Uz) => "Bekor qilindi",
    }
}

fn delivery_label(delivery: DeliveryType, language: Language) -> &'static str {
    match delivery {
        DeliveryType::Pickup => language.pick("Самовывоз", "Olib ketish"),
        DeliveryType::Delivery => language.pick("Доставка", "Yetkazib berish"),
    }
}

fn payment_label(payment: PaymentMethod, language: Language) -> &'static str {
    match payment {
        PaymentMethod::Cash => language.pick("Наличные", "Naqd"),
        PaymentMethod::Card => language.pick("Карта", "Karta"),
    }
}

fn item_lines(order: &Order, language: Language) -> String {
    order
        .items
        .iter()
        .map(|item| {
            let name = language.pick(&item.name_ru, &item.name_uz);
            format!(
                "• {} × {} = {}",
                escape_html(name),
                item.quantity,
                format_sum(item.line_total, language)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Confirmation sent to the customer after checkout.
pub fn order_created_message(order: &Order, language: Language) -> String {
    let heading = match language {
        Language::Ru => format!("✅ Заказ <b>#{}</b> принят!", order.id),
        Language::Uz => format!("✅ <b>#{}</b> buyurtma qabul qilindi!", order.id),
    };
    format!(
        "{heading}\n\n{}\n\n{}: <b>{}</b>\n{}: {}\n{}: {}",
        item_lines(order, language),
        language.pick("Итого", "Jami"),
        format_sum(order.total_amount, language),
        language.pick("Получение", "Qabul qilish"),
        delivery_label(order.delivery_type, language),
        language.pick("Оплата", "To'lov"),
        payment_label(order.payment_method, language),
    )
}

/// Status update sent to the customer.
pub fn status_changed_message(order: &Order, language: Language) -> String {
    let status = status_label(order.status, language);
    match language {
        Language::Ru => format!("📦 Статус заказа <b>#{}</b>: {status}", order.id),
        Language::Uz => format!("📦 <b>#{}</b> buyurtma holati: {status}", order.id),
    }
}

/// Digest for the admin chat. Always in Russian.
pub fn admin_new_order_message(order: &Order, customer: &User) -> String {
    let language = Language::Ru;
    let mut name = escape_html(&customer.first_name);
    if let Some(last) = &customer.last_name {
        name.push(' ');
        name.push_str(&escape_html(last));
    }
    let username = customer
        .username
        .as_deref()
        .map(|u| format!(" (@{})", escape_html(u)))
        .unwrap_or_default();
    let address = order
        .address
        .as_deref()
        .map(|a| format!("\nАдрес: {}", escape_html(a)))
        .unwrap_or_default();
    let comment = order
        .comment
        .as_deref()
        .map(|c| format!("\nКомментарий: {}", escape_html(c)))
        .unwrap_or_default();
    format!(
        "🛒 Новый заказ <b>#{}</b>\nКлиент: {name}{username}\nТелефон: {}\n{}{address}{comment}\n\n{}\n\nИтого: <b>{}</b>, {}",
        order.id,
        escape_html(&order.phone),
        delivery_label(order.delivery_type, language),
        item_lines(order, language),
        format_sum(order.total_amount, language),
        payment_label(order.payment_method, language),
    )
}

/// Reply to `/start`.
pub fn welcome_message(language: Language) -> (&'static str, &'static str) {
    match language {
        Language::Ru => (
            "Добро пожаловать в Amazing Store! Нажмите кнопку ниже, чтобы открыть магазин.",
            "Открыть магазин",
        ),
        Language::Uz => (
            "Amazing Store'ga xush kelibsiz! Do'konni ochish uchun quyidagi tugmani bosing.",
            "Do'konni ochish",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::OrderItem;
    use chrono::Utc;
    use rstest::{fixture, rstest};

    #[fixture]
    fn order() -> Order {
        Order {
            id: 42,
            user_id: 1,
            status: OrderStatus::Ready,
            total_amount: 1_250_000,
            phone: "+998901234567".to_owned(),
            address: Some("Chilonzor <7>".to_owned()),
            comment: None,
            delivery_type: DeliveryType::Delivery,
            payment_method: PaymentMethod::Card,
            items: vec![OrderItem {
                product_id: 3,
                sku: "TEA".to_owned(),
                name_ru: "Чай & кофе".to_owned(),
                name_uz: "Choy".to_owned(),
                quantity: 2,
                unit_price: 625_000,
                line_total: 1_250_000,
            }],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[rstest]
    #[case(0, "0 сум")]
    #[case(999, "999 сум")]
    #[case(1_000, "1 000 сум")]
    #[case(1_250_000, "1 250 000 сум")]
    #[case(-15_000, "-15 000 сум")]
    fn formats_sums(#[case] amount: i64, #[case] expected: &str) {
        assert_eq!(format_sum(amount, Language::Ru), expected);
    }

    #[rstest]
    fn escapes_html() {
        assert_eq!(escape_html("a<b>&c"), "a&lt;b&gt;&amp;c");
    }

    #[rstest]
    fn created_message_is_localised(order: Order) {
        let ru = order_created_message(&order, Language::Ru);
        assert!(ru.contains("#42"));
        assert!(ru.contains("Чай &amp; кофе × 2"));
        assert!(ru.contains("1 250 000 сум"));

        let uz = order_created_message(&order, Language::Uz);
        assert!(uz.contains("Choy × 2"));
        assert!(uz.contains("so'm"));
    }

    #[rstest]
    fn status_message_names_status(order: Order) {
        assert!(status_changed_message(&order, Language::Uz).contains("Tayyor"));
        assert!(status_changed_message(&order, Language::Ru).contains("Готов к выдаче"));
    }

    #[rstest]
    fn admin_digest_escapes_customer_input(order: Order) {
        let customer = User {
            id: 1,
            telegram_id: 100,
            first_name: "<Ali>".to_owned(),
            last_name: None,
            username: Some("ali".to_owned()),
            phone: None,
            language: Language::Uz,
            is_admin: false,
            created_at: Utc::now(),
        };
        let text = admin_new_order_message(&order, &customer);
        assert!(text.contains("&lt;Ali&gt; (@ali)"));
        assert!(text.contains("Chilonzor &lt;7&gt;"));
    }
}
