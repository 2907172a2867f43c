//! Request bodies sent to the partner APIs.

use serde::Serialize;

use crate::domain::SyncListing;

/// Shop currency for price updates.
const CURRENCY: &str = "UZS";

#[derive(Debug, Serialize)]
pub(super) struct YandexPriceUpdates<'a> {
    pub(super) offers: Vec<YandexOfferPrice<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct YandexOfferPrice<'a> {
    pub(super) offer_id: &'a str,
    pub(super) price: YandexPrice,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct YandexPrice {
    pub(super) value: i64,
    pub(super) currency_id: &'static str,
}

#[derive(Debug, Serialize)]
pub(super) struct YandexStockUpdates<'a> {
    pub(super) skus: Vec<YandexSkuStock<'a>>,
}

#[derive(Debug, Serialize)]
pub(super) struct YandexSkuStock<'a> {
    pub(super) sku: &'a str,
    pub(super) items: Vec<YandexStockItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct YandexStockItem {
    pub(super) count: i32,
}

impl<'a> YandexPriceUpdates<'a> {
    pub(super) fn single(listing: &'a SyncListing) -> Self {
        Self {
            offers: vec![YandexOfferPrice {
                offer_id: listing.offer_id.as_str(),
                price: YandexPrice {
                    value: listing.price,
                    currency_id: CURRENCY,
                },
            }],
        }
    }
}

impl<'a> YandexStockUpdates<'a> {
    pub(super) fn single(listing: &'a SyncListing) -> Self {
        Self {
            skus: vec![YandexSkuStock {
                sku: listing.offer_id.as_str(),
                items: vec![YandexStockItem {
                    count: listing.stock.max(0),
                }],
            }],
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UzumPriceData<'a> {
    pub(super) sku_list: Vec<UzumSkuPrice<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UzumSkuPrice<'a> {
    pub(super) sku_title: &'a str,
    pub(super) full_price: i64,
    pub(super) sell_price: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UzumStockUpdates<'a> {
    pub(super) sku_amount_list: Vec<UzumSkuAmount<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UzumSkuAmount<'a> {
    pub(super) sku_title: &'a str,
    pub(super) amount: i32,
}

impl<'a> UzumPriceData<'a> {
    pub(super) fn single(listing: &'a SyncListing) -> Self {
        Self {
            sku_list: vec![UzumSkuPrice {
                sku_title: listing.offer_id.as_str(),
                full_price: listing.price,
                sell_price: listing.price,
            }],
        }
    }
}

impl<'a> UzumStockUpdates<'a> {
    pub(super) fn single(listing: &'a SyncListing) -> Self {
        Self {
            sku_amount_list: vec![UzumSkuAmount {
                sku_title: listing.offer_id.as_str(),
                amount: listing.stock.max(0),
            }],
        }
    }
}
