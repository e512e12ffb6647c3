use utoipa::OpenApi;
use utoipa::openapi::OpenApi as OpenApiSpec;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    cart::{CartLine, CartSnapshot},
    checkout::{PaymentMethod, Receipt},
    dto::{
        cart::{AddCartItemRequest, UpdateCartLineRequest},
        categories::{CategoryList, CreateCategoryRequest},
        orders::{CheckoutRequest, OrderItemDetail, OrderList, OrderWithItems},
        products::{CreateProductRequest, ProductDto, ProductList, UpdateProductRequest},
    },
    models::{Business, Category, Order, OrderItem, Product, StaffProfile, Store},
    response::{ApiResponse, Meta},
    routes::{businesses, cart, categories, health, orders, params, products},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        businesses::get_business_by_slug,
        categories::list_categories,
        categories::create_category,
        categories::delete_category,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        cart::view_cart,
        cart::add_item,
        cart::update_quantity,
        cart::remove_item,
        cart::clear_cart,
        orders::list_orders,
        orders::checkout,
        orders::get_order,
    ),
    components(
        schemas(
            Business,
            Store,
            StaffProfile,
            Category,
            Product,
            Order,
            OrderItem,
            CartLine,
            CartSnapshot,
            PaymentMethod,
            Receipt,
            AddCartItemRequest,
            UpdateCartLineRequest,
            CreateCategoryRequest,
            CategoryList,
            CheckoutRequest,
            OrderItemDetail,
            OrderList,
            OrderWithItems,
            CreateProductRequest,
            UpdateProductRequest,
            ProductDto,
            ProductList,
            params::Pagination,
            params::ProductQuery,
            params::OrderListQuery,
            health::HealthData,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CartSnapshot>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<CategoryList>,
            ApiResponse<Business>
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Businesses", description = "Tenant resolution"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Products", description = "Product endpoints"),
        (name = "Cart", description = "Register current-order endpoints"),
        (name = "Orders", description = "Checkout and transaction history"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
