//! `cart.html` and the thank-you view that replaces it after payment

use serde::Serialize;
use tracing::info;

use crate::config::PaymentCard;
use crate::data::ScenarioRecord;
use crate::error::E2eResult;
use crate::ui::{xpath_literal, ClickMode, Locator, UiDriver};
use crate::verify::cart::CartLineItem;

use super::{number_after, require, text_after, wait_count, Header};

/// Separator between label and value in cart fields, e.g. `尺寸｜M`
const FIELD_SEP: char = '｜';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeliverTime {
    Morning,
    Afternoon,
    Anytime,
}

impl DeliverTime {
    /// Anything else leaves the radio group untouched
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Morning" => Some(DeliverTime::Morning),
            "Afternoon" => Some(DeliverTime::Afternoon),
            "Anytime" => Some(DeliverTime::Anytime),
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            DeliverTime::Morning => "08:00-12:00",
            DeliverTime::Afternoon => "14:00-18:00",
            DeliverTime::Anytime => "不指定",
        }
    }
}

/// Recipient and card input of one checkout row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutForm {
    pub receiver: String,
    pub email: String,
    pub mobile: String,
    pub address: String,
    pub deliver_time: Option<DeliverTime>,
    pub card: PaymentCard,
}

impl CheckoutForm {
    pub fn from_record(record: &ScenarioRecord) -> E2eResult<Self> {
        Ok(Self {
            receiver: record.get("Receiver")?.to_string(),
            email: record.get("Email")?.to_string(),
            mobile: record.get("Mobile")?.to_string(),
            address: record.get("Address")?.to_string(),
            deliver_time: DeliverTime::parse(record.get("Deliver Time")?),
            card: PaymentCard {
                number: record.get("Credit Card No")?.to_string(),
                expiry: record.get("Expiry Date")?.to_string(),
                security_code: record.get("Security Code")?.to_string(),
            },
        })
    }
}

fn items() -> Locator {
    Locator::css("div.cart__item")
}

fn labelled_input(label: &str) -> Locator {
    Locator::xpath(format!("//div[text()={}]/following-sibling::input", xpath_literal(label)))
}

fn deliver_time_radio(time: DeliverTime) -> Locator {
    Locator::xpath(format!("//label[text()={}]/child::input", xpath_literal(time.label())))
}

fn checkout_button() -> Locator {
    Locator::css("button.checkout-button")
}

fn thank_you() -> Locator {
    Locator::class("thankyou__content")
}

fn quantity_selector() -> Locator {
    Locator::css("select.cart__item-quantity-selector")
}

/// Where the card fields live. The cart and the prime page name the
/// security code input differently.
pub(crate) struct CardFields {
    pub security_code_id: &'static str,
}

impl CardFields {
    pub const CART: CardFields = CardFields {
        security_code_id: "cc-ccv",
    };
}

/// Type the card into the three hosted payment frames, one at a time
pub(crate) async fn fill_card(
    driver: &dyn UiDriver,
    wait_ms: u64,
    card: &PaymentCard,
    fields: &CardFields,
) -> E2eResult<()> {
    let frames = [
        ("card-number", "cc-number", card.number.as_str()),
        ("card-expiration-date", "cc-exp", card.expiry.as_str()),
        ("card-ccv", fields.security_code_id, card.security_code.as_str()),
    ];
    for (container, input, value) in frames {
        driver
            .enter_frame(&Locator::xpath(format!("//div[@id='{}']/iframe", container)), wait_ms)
            .await?;
        driver.fill(&Locator::id(input), value, wait_ms).await?;
        driver.leave_frame().await?;
    }
    Ok(())
}

pub struct CartPage<'a> {
    driver: &'a dyn UiDriver,
    wait_ms: u64,
}

impl<'a> CartPage<'a> {
    pub fn new(driver: &'a dyn UiDriver, wait_ms: u64) -> Self {
        Self { driver, wait_ms }
    }

    pub async fn open(&self, url: &str) -> E2eResult<()> {
        self.driver.goto(url).await
    }

    pub fn header(&self) -> Header<'a> {
        Header::new(self.driver, self.wait_ms)
    }

    pub async fn alert(&self) -> E2eResult<String> {
        self.driver.wait_alert(self.wait_ms).await
    }

    /// Number of cart lines, once at least one is rendered
    pub async fn item_count(&self) -> E2eResult<usize> {
        self.driver.wait_count_above(&items(), 0, self.wait_ms).await
    }

    pub async fn wait_item_count(&self, expected: usize) -> E2eResult<usize> {
        wait_count(self.driver, &items(), expected, self.wait_ms).await
    }

    fn field(&self, index: usize, class: &str) -> Locator {
        items().nth(index).within(&Locator::class(class))
    }

    async fn field_text(&self, index: usize, class: &str) -> E2eResult<String> {
        self.driver.text(&self.field(index, class), self.wait_ms).await
    }

    /// Line `index` as rendered
    pub async fn line_item(&self, index: usize) -> E2eResult<CartLineItem> {
        Ok(CartLineItem {
            id: self.field_text(index, "cart__item-id").await?,
            name: self.field_text(index, "cart__item-name").await?,
            color: text_after(&self.field_text(index, "cart__item-color").await?, FIELD_SEP),
            size: text_after(&self.field_text(index, "cart__item-size").await?, FIELD_SEP),
            quantity: self.quantity(index).await?,
            price: self.price(index).await?,
            subtotal: self.subtotal(index).await?,
        })
    }

    /// Every line in display order
    pub async fn line_items(&self) -> E2eResult<Vec<CartLineItem>> {
        let count = self.item_count().await?;
        let mut lines = Vec::with_capacity(count);
        for index in 0..count {
            lines.push(self.line_item(index).await?);
        }
        Ok(lines)
    }

    /// Editable in the cart, plain text on the thank-you view
    pub async fn quantity(&self, index: usize) -> E2eResult<u32> {
        let selector = items().nth(index).within(&quantity_selector());
        let text = if self.driver.count(&selector).await? > 0 {
            self.driver.selected_option(&selector, self.wait_ms).await?
        } else {
            let fixed = Locator::xpath(".//div[@class='cart__item-quantity']/div[last()]");
            self.driver.text(&items().nth(index).within(&fixed), self.wait_ms).await?
        };
        number_after(&text, FIELD_SEP)
    }

    pub async fn price(&self, index: usize) -> E2eResult<u32> {
        number_after(&self.field_text(index, "cart__item-price-content").await?, '.')
    }

    pub async fn subtotal(&self, index: usize) -> E2eResult<u32> {
        number_after(&self.field_text(index, "cart__item-subtotal-content").await?, '.')
    }

    pub async fn change_quantity(&self, index: usize, quantity: u32) -> E2eResult<()> {
        info!("Changing line {} to quantity {}", index, quantity);
        let selector = items().nth(index).within(&quantity_selector());
        self.driver.select_option(&selector, &quantity.to_string(), self.wait_ms).await
    }

    pub async fn remove(&self, index: usize) -> E2eResult<()> {
        info!("Removing line {}", index);
        self.driver
            .click(&self.field(index, "cart__delete-button"), ClickMode::Native, self.wait_ms)
            .await
    }

    pub async fn fill_order_info(&self, form: &CheckoutForm) -> E2eResult<()> {
        self.driver.fill(&labelled_input("收件人姓名"), &form.receiver, self.wait_ms).await?;
        self.driver.fill(&labelled_input("Email"), &form.email, self.wait_ms).await?;
        self.driver.fill(&labelled_input("手機"), &form.mobile, self.wait_ms).await?;
        self.driver.fill(&labelled_input("地址"), &form.address, self.wait_ms).await?;
        if let Some(time) = form.deliver_time {
            self.driver
                .click(&deliver_time_radio(time), ClickMode::Script, self.wait_ms)
                .await?;
        }
        Ok(())
    }

    pub async fn fill_payment_info(&self, card: &PaymentCard) -> E2eResult<()> {
        fill_card(self.driver, self.wait_ms, card, &CardFields::CART).await
    }

    pub async fn checkout(&self) -> E2eResult<()> {
        info!("Checking out");
        self.driver.click(&checkout_button(), ClickMode::Script, self.wait_ms).await
    }

    pub async fn wait_for_thank_you(&self) -> E2eResult<()> {
        require(self.driver, &thank_you(), self.wait_ms).await
    }
}
