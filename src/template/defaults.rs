//! Built-in default templates, used during template resolution when a
//! document names no explicit template.

use crate::document::models::DocumentType;

const QUOTE_TEMPLATE: &str = "\
QUOTE

{{ company.name }}
{{ company.address }}
{{ company.email }}

QUOTE No {{ quote.number }}
Date: {{ quote.date }}
Valid until: {{ quote.valid_until }}

Client:
{{ client.name }}
{{ client.address }}

Services

{% for service in services %}{{ service.description }}
- Quantity: {{ service.quantity }}
- Unit price: {{ service.unit_price }}€
- Total: {{ service.total }}€

{% endfor %}
Subtotal: {{ subtotal }}€
VAT ({{ vat_rate }}%): {{ vat }}€
Total: {{ total }}€

Payment terms:
{{ payment_terms }}

Signature:
_________________
";

const INVOICE_TEMPLATE: &str = "\
INVOICE

{{ company.name }}
{{ company.address }}
{{ company.email }}

INVOICE No {{ invoice.number }}
Date: {{ invoice.date }}
Due date: {{ invoice.due_date }}

Client:
{{ client.name }}
{{ client.address }}

Services

{% for service in services %}{{ service.description }}
- Quantity: {{ service.quantity }}
- Unit price: {{ service.unit_price }}€
- Total: {{ service.total }}€

{% endfor %}
Subtotal: {{ subtotal }}€
VAT ({{ vat_rate }}%): {{ vat }}€
Total: {{ total }}€

IBAN: {{ iban }}
BIC: {{ bic }}
";

const CONTRACT_TEMPLATE: &str = "\
SERVICE AGREEMENT

Between the undersigned:

{{ provider.name }} (hereinafter \"the Provider\")
{{ provider.address }}
{{ provider.email }}

AND

{{ client.name }} (hereinafter \"the Client\")
{{ client.address }}
{{ client.email }}

Article 1 - Purpose

This agreement covers the delivery of {{ scope }}.

Article 2 - Term

The agreement takes effect on {{ start_date }} for a duration of {{ duration }}.

Article 3 - Price

The total price of the services amounts to {{ amount }}€ including tax.

Article 4 - Payment terms

{{ payment_terms }}

Article 5 - Obligations of the parties

{{ obligations }}

Provider signature: _________________
Client signature: _________________
";

/// Default template text for a document type, when one exists.
pub fn builtin_template(document_type: DocumentType) -> Option<&'static str> {
    match document_type {
        DocumentType::Quote => Some(QUOTE_TEMPLATE),
        DocumentType::Invoice => Some(INVOICE_TEMPLATE),
        DocumentType::Contract => Some(CONTRACT_TEMPLATE),
        DocumentType::Letter | DocumentType::Terms | DocumentType::Other => None,
    }
}
