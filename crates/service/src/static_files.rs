//! Embedded admin page
//!
//! Element ids follow the catalog UI convention: fields are `product_<field>`,
//! buttons are `<label>-btn`, results render into `product-list` and status
//! text into `flash_message`.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

/// Title the acceptance suite looks for on the home page
pub const PAGE_TITLE: &str = "Product Catalog Administration";

/// Serve an embedded asset by path relative to `/static/`
pub fn serve(path: &str) -> Response {
    match path {
        "console.js" => serve_embedded(CONSOLE_JS, guess_content_type(path)),
        _ => (StatusCode::NOT_FOUND, "File not found").into_response(),
    }
}

/// The admin page itself
pub fn index() -> Response {
    serve_embedded(INDEX_HTML, "text/html; charset=utf-8")
}

fn guess_content_type(path: &str) -> &'static str {
    if path.ends_with(".js") {
        "application/javascript"
    } else if path.ends_with(".css") {
        "text/css"
    } else if path.ends_with(".html") {
        "text/html"
    } else {
        "application/octet-stream"
    }
}

fn serve_embedded(content: &'static str, content_type: &'static str) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type)],
        content,
    )
        .into_response()
}

/// Admin page markup
pub const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Product Catalog Administration</title>
</head>
<body>
    <h1>Product Catalog Administration</h1>
    <div id="flash_message"></div>
    <form id="product-form" onsubmit="return false;">
        <label for="product_id">ID</label>
        <input type="text" id="product_id">
        <label for="product_name">Name</label>
        <input type="text" id="product_name">
        <label for="product_description">Description</label>
        <input type="text" id="product_description">
        <label for="product_price">Price</label>
        <input type="text" id="product_price">
        <label for="product_available">Available</label>
        <select id="product_available">
            <option value="true" selected>True</option>
            <option value="false">False</option>
        </select>
        <label for="product_category">Category</label>
        <select id="product_category">
            <option value="UNKNOWN" selected>Unknown</option>
            <option value="CLOTHS">Cloths</option>
            <option value="FOOD">Food</option>
            <option value="HOUSEWARES">Housewares</option>
            <option value="AUTOMOTIVE">Automotive</option>
            <option value="TOOLS">Tools</option>
        </select>
        <button id="create-btn">Create</button>
        <button id="retrieve-btn">Retrieve</button>
        <button id="update-btn">Update</button>
        <button id="delete-btn">Delete</button>
        <button id="clear-btn">Clear</button>
        <button id="search-btn">Search</button>
    </form>
    <table>
        <thead>
            <tr><th>ID</th><th>Name</th><th>Description</th><th>Price</th><th>Available</th><th>Category</th></tr>
        </thead>
        <tbody id="product-list"></tbody>
    </table>
    <script src="/static/console.js"></script>
</body>
</html>
"#;

/// Script wiring the admin page buttons to the REST routes
pub const CONSOLE_JS: &str = r#"
const $ = (id) => document.getElementById(id);

function flash(message) { $('flash_message').textContent = message; }

function formData() {
    return {
        name: $('product_name').value,
        description: $('product_description').value,
        price: $('product_price').value,
        available: $('product_available').value === 'true',
        category: $('product_category').value,
    };
}

function fill(p) {
    $('product_id').value = p.id;
    $('product_name').value = p.name;
    $('product_description').value = p.description;
    $('product_price').value = p.price;
    $('product_available').value = p.available ? 'true' : 'false';
    $('product_category').value = p.category;
}

function clearForm() {
    ['product_id', 'product_name', 'product_description', 'product_price']
        .forEach((id) => { $(id).value = ''; });
    $('product_available').value = 'true';
    $('product_category').value = 'UNKNOWN';
}

function render(products) {
    const rows = products.map((p) => {
        const tr = document.createElement('tr');
        [p.id, p.name, p.description, p.price, p.available ? 'True' : 'False', p.category]
            .forEach((value) => {
                const td = document.createElement('td');
                td.textContent = value;
                tr.appendChild(td);
            });
        return tr;
    });
    $('product-list').replaceChildren(...rows);
}

// Drop the previous outcome before a request so waits only match its result
function begin(clearResults) {
    flash('');
    if (clearResults) { $('product-list').replaceChildren(); }
}

async function call(method, url, body) {
    const opts = { method, headers: {} };
    if (body !== undefined) {
        opts.headers['Content-Type'] = 'application/json';
        opts.body = JSON.stringify(body);
    }
    const resp = await fetch(url, opts);
    const data = resp.status === 204 ? null : await resp.json();
    return { ok: resp.ok, data };
}

$('create-btn').onclick = async () => {
    begin(false);
    const r = await call('POST', '/products', formData());
    if (r.ok) { fill(r.data); flash('Success'); } else { flash(r.data.message); }
};

$('retrieve-btn').onclick = async () => {
    begin(true);
    const r = await call('GET', `/products/${$('product_id').value}`);
    if (r.ok) { fill(r.data); render([r.data]); flash('Success'); } else { clearForm(); flash(r.data.message); }
};

$('update-btn').onclick = async () => {
    begin(true);
    const r = await call('PUT', `/products/${$('product_id').value}`, formData());
    if (r.ok) { fill(r.data); render([r.data]); flash('Success'); } else { flash(r.data.message); }
};

$('delete-btn').onclick = async () => {
    begin(false);
    const r = await call('DELETE', `/products/${$('product_id').value}`);
    if (r.ok) { clearForm(); flash('Product has been Deleted!'); } else { flash(r.data.message); }
};

$('clear-btn').onclick = () => { clearForm(); flash(''); };

$('search-btn').onclick = async () => {
    begin(true);
    const params = new URLSearchParams();
    if ($('product_name').value) { params.set('name', $('product_name').value); }
    const r = await call('GET', `/products?${params.toString()}`);
    if (r.ok) { render(r.data); if (r.data.length > 0) { fill(r.data[0]); } flash('Success'); } else { flash(r.data.message); }
};
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_carries_title_and_convention_ids() {
        assert!(INDEX_HTML.contains(PAGE_TITLE));
        for id in ["product_name", "product_category", "search-btn", "product-list", "flash_message"] {
            assert!(INDEX_HTML.contains(&format!("id=\"{}\"", id)), "missing {}", id);
        }
    }

    #[test]
    fn test_unknown_asset_is_404() {
        assert_eq!(serve("missing.js").status(), StatusCode::NOT_FOUND);
        assert_eq!(serve("console.js").status(), StatusCode::OK);
    }
}
