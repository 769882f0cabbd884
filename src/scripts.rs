//! In-page JavaScript used by [`crate::page::Page`].
//!
//! Each body runs inside [`wrap`], which injects the call arguments as `args`,
//! the shared helpers below, and JSON-encodes whatever the body returns.

use serde_json::Value;

/// Attribute marking the single element the next CDP click or upload targets.
pub const TARGET_ATTR: &str = "data-autofill-target";

/// Footer button that saves the step and moves on ("Save and Continue",
/// "Next", "Submit").
pub const NEXT_BUTTON: &str = r#"button[data-automation-id="pageFooterNextButton"]"#;

/// Build an expression evaluating `body` with `args` bound.
pub fn wrap(args: Value, body: &str) -> String {
    format!(
        "(() => {{\nconst args = {args};\n{PRELUDE}\nconst __result = (() => {{\n{body}\n}})();\nreturn JSON.stringify(__result === undefined ? null : __result);\n}})()"
    )
}

static PRELUDE: &str = r#"
const __clean = (t) => (t || '').replace(/\s+/g, ' ').trim();
const __visible = (el) => {
    if (!el || !el.isConnected) return false;
    const style = window.getComputedStyle(el);
    if (style.display === 'none' || style.visibility === 'hidden') return false;
    return el.getClientRects().length > 0;
};
const __lookup = (handle) => document.getElementById(handle)
    || document.querySelector('[data-autofill-id="' + CSS.escape(handle) + '"]');
const __mark = (el) => {
    document.querySelectorAll('[data-autofill-target]')
        .forEach((n) => n.removeAttribute('data-autofill-target'));
    if (el) el.setAttribute('data-autofill-target', '1');
    return !!el;
};
const __choiceLabel = (input) => {
    const forLabel = input.id
        ? document.querySelector('label[for="' + CSS.escape(input.id) + '"]')
        : null;
    const label = forLabel || input.closest('label');
    return __clean((label && label.innerText) || input.getAttribute('aria-label') || input.value);
};
const __radios = (root) => {
    if (root.matches('input[type="radio"]')) {
        return root.name
            ? Array.from(document.querySelectorAll('input[type="radio"][name="' + CSS.escape(root.name) + '"]'))
            : [root];
    }
    return Array.from(root.querySelectorAll('input[type="radio"]'));
};
"#;

/// Scan every interactive control. Returns `RawField` objects in DOM order.
pub static SCAN_FIELDS: &str = r#"
const COMPOSITE = '[data-automation-id="multiSelectContainer"], [data-automation-id="dateInputWrapper"], [data-automation-id="attachments-FileUpload"]';
const SKIP_TYPES = ['hidden', 'submit', 'button', 'reset', 'image'];
window.__autofillSeq = window.__autofillSeq || 0;

const handleOf = (el) => {
    if (el.id) return el.id;
    if (!el.getAttribute('data-autofill-id')) {
        el.setAttribute('data-autofill-id', 'autofill-' + (window.__autofillSeq++));
    }
    return el.getAttribute('data-autofill-id');
};

const labelFor = (el) => {
    if (el.id) {
        const l = document.querySelector('label[for="' + CSS.escape(el.id) + '"]');
        if (l && __clean(l.innerText)) return __clean(l.innerText);
    }
    const wrap = el.closest('label');
    if (wrap && __clean(wrap.innerText)) return __clean(wrap.innerText);
    const fieldset = el.closest('fieldset');
    if (fieldset) {
        const legend = fieldset.querySelector('legend');
        if (legend && __clean(legend.innerText)) return __clean(legend.innerText);
    }
    const by = el.getAttribute('aria-labelledby');
    if (by) {
        const text = __clean(by.split(/\s+/)
            .map((id) => document.getElementById(id))
            .filter((n) => n && n !== el && !n.contains(el))
            .map((n) => n.innerText)
            .join(' '));
        if (text) return text;
    }
    const container = el.closest('[data-automation-id^="formField-"]');
    if (container) {
        const l = container.querySelector('label');
        if (l && __clean(l.innerText)) return __clean(l.innerText);
    }
    if (el.matches(COMPOSITE)) {
        const l = el.querySelector('label, [data-automation-id="fileUploadLabel"]');
        if (l && __clean(l.innerText)) return __clean(l.innerText);
    }
    return '';
};

const precedingText = (el) => {
    const walker = document.createTreeWalker(document.body, NodeFilter.SHOW_TEXT);
    let last = '';
    while (walker.nextNode()) {
        const node = walker.currentNode;
        if (!(node.compareDocumentPosition(el) & Node.DOCUMENT_POSITION_FOLLOWING)) break;
        const parent = node.parentElement;
        if (!parent || ['SCRIPT', 'STYLE', 'NOSCRIPT', 'OPTION'].includes(parent.tagName)) continue;
        const text = __clean(node.textContent);
        if (text && __visible(parent)) last = text;
    }
    return last.slice(0, 200);
};

const out = [];
const seenGroups = new Set();
const nodes = document.querySelectorAll(
    COMPOSITE + ', button[aria-haspopup="listbox"], input, select, textarea, [role="combobox"]:not(input)'
);

for (const el of nodes) {
    const composite = el.closest(COMPOSITE);
    if (composite && composite !== el) continue;

    const tag = el.tagName.toLowerCase();
    const type = (el.getAttribute('type') || '').toLowerCase();
    if (tag === 'input' && SKIP_TYPES.includes(type)) continue;

    let target = el;
    let options = [];
    let disabled = el.disabled === true || el.getAttribute('aria-disabled') === 'true';

    if (tag === 'input' && type === 'radio') {
        const group = el.closest('fieldset, [role="radiogroup"]');
        const key = el.name ? 'name:' + el.name : group;
        if (key && seenGroups.has(key)) continue;
        if (key) seenGroups.add(key);
        const radios = group ? __radios(group) : __radios(el);
        options = radios.map(__choiceLabel);
        disabled = radios.every((r) => r.disabled);
        target = group || el;
    } else if (tag === 'select') {
        options = Array.from(el.options).map((o) => __clean(o.text));
    }

    const automationId = target.getAttribute('data-automation-id') || '';
    const hasPopup = target.getAttribute('aria-haspopup') || '';
    const labelText = labelFor(target);
    const ariaLabel = __clean(target.getAttribute('aria-label'));
    const hidden = !__visible(target);
    const requiredAttr = target.required === true
        || target.getAttribute('aria-required') === 'true'
        || (composite === el && !!el.querySelector('[required], [aria-required="true"]'))
        || (target !== el && el.required === true);

    out.push({
        tag,
        type,
        role: target.getAttribute('role') || '',
        automationId,
        hasPopup,
        multiple: target.multiple === true,
        id: handleOf(target),
        name: el.name || '',
        labelText,
        ariaLabel,
        precedingText: (labelText || ariaLabel || hidden) ? '' : precedingText(target),
        requiredAttr,
        hidden,
        disabled,
        options,
        needsOptions: (tag === 'button' && hasPopup === 'listbox')
            || automationId === 'multiSelectContainer',
    });
}
return out;
"#;

/// Visible options of the currently open listbox, in display order.
pub static READ_OPTIONS: &str = r#"
const seen = new Set();
const out = [];
const nodes = document.querySelectorAll(
    '[role="listbox"] [role="option"], [data-automation-id="promptOption"], [data-automation-id="picklistOption"]'
);
for (const node of nodes) {
    if (!__visible(node)) continue;
    const text = __clean(node.innerText);
    if (!text || seen.has(text)) continue;
    seen.add(text);
    out.push(text);
}
return out;
"#;

/// Mark the open listbox option whose text equals `args.choice`.
pub static MARK_OPTION: &str = r#"
const wanted = __clean(args.choice).toLowerCase();
const nodes = document.querySelectorAll(
    '[role="listbox"] [role="option"], [data-automation-id="promptOption"], [data-automation-id="picklistOption"]'
);
for (const node of nodes) {
    if (__visible(node) && __clean(node.innerText).toLowerCase() === wanted) return __mark(node);
}
return __mark(null);
"#;

/// Mark `args.handle` itself or its first descendant matching `args.selector`.
pub static MARK_WITHIN: &str = r#"
const root = __lookup(args.handle);
if (!root) return __mark(null);
return __mark(root.matches(args.selector) ? root : root.querySelector(args.selector));
"#;

/// Mark the radio (preferably its label) whose caption equals `args.choice`.
pub static MARK_RADIO: &str = r#"
const root = __lookup(args.handle);
if (!root) return __mark(null);
const wanted = __clean(args.choice).toLowerCase();
for (const radio of __radios(root)) {
    if (__choiceLabel(radio).toLowerCase() !== wanted) continue;
    const label = radio.id ? document.querySelector('label[for="' + CSS.escape(radio.id) + '"]') : null;
    return __mark(label && __visible(label) ? label : radio);
}
return __mark(null);
"#;

/// Select `args.choices` on a native `<select>`. Returns "done", "missing",
/// or "not-native" when the control is a Workday popup.
pub static SELECT_NATIVE: &str = r#"
const el = __lookup(args.handle);
if (!el) return 'missing';
if (el.tagName !== 'SELECT') return 'not-native';
const wanted = args.choices.map((c) => __clean(c).toLowerCase());
let hits = 0;
for (const opt of el.options) {
    const hit = wanted.includes(__clean(opt.text).toLowerCase());
    if (el.multiple) {
        opt.selected = hit;
    } else if (hit && hits === 0) {
        el.value = opt.value;
    }
    if (hit) hits++;
}
el.dispatchEvent(new Event('input', { bubbles: true }));
el.dispatchEvent(new Event('change', { bubbles: true }));
return hits > 0 ? 'done' : 'missing';
"#;

/// Set the value of a text-like control, or of each part of a date wrapper
/// (`args.value` split on `/`, `-`, `.` or spaces).
pub static FILL_TEXT: &str = r#"
const el = __lookup(args.handle);
if (!el) return false;
const setValue = (input, value) => {
    const proto = input.tagName === 'TEXTAREA' ? HTMLTextAreaElement.prototype : HTMLInputElement.prototype;
    const setter = Object.getOwnPropertyDescriptor(proto, 'value').set;
    input.focus();
    setter.call(input, value);
    input.dispatchEvent(new Event('input', { bubbles: true }));
    input.dispatchEvent(new Event('change', { bubbles: true }));
    input.blur();
};
if (el.tagName === 'INPUT' || el.tagName === 'TEXTAREA') {
    setValue(el, args.value);
    return true;
}
const inputs = Array.from(el.querySelectorAll('input'));
if (!inputs.length) return false;
const pieces = String(args.value).split(/[\/\-.\s]+/).filter(Boolean);
inputs.forEach((input, i) => {
    if (pieces[i] !== undefined) setValue(input, pieces[i]);
});
return true;
"#;

/// Mark the checkbox behind `args.handle` if it needs a click to reach
/// `args.checked`. Returns "missing", "ok" or "click".
pub static PREPARE_CHECKBOX: &str = r#"
const root = __lookup(args.handle);
if (!root) return 'missing';
const box = root.matches('input[type="checkbox"]') ? root : root.querySelector('input[type="checkbox"]');
if (!box) return 'missing';
if (box.checked === args.checked) return 'ok';
__mark(box);
return 'click';
"#;

/// Mark the first visible button-like element whose caption equals one of
/// `args.labels` (case-insensitive).
pub static MARK_BUTTON: &str = r#"
const wanted = args.labels.map((l) => l.toLowerCase());
const nodes = document.querySelectorAll('button, [role="button"], a, input[type="submit"]');
for (const node of nodes) {
    if (!__visible(node) || node.disabled) continue;
    const caption = __clean(node.innerText || node.value || node.getAttribute('aria-label')).toLowerCase();
    if (wanted.includes(caption)) return __mark(node);
}
return __mark(null);
"#;

/// Mark the "Add" button of the repeatable section whose heading reads
/// `args.heading`.
pub static MARK_ADD: &str = r#"
const wanted = __clean(args.heading).toLowerCase();
const headings = Array.from(document.querySelectorAll('h2, h3, h4'))
    .filter((h) => __clean(h.innerText).toLowerCase() === wanted);
for (const heading of headings) {
    const section = (heading.id
        && document.querySelector('[role="group"][aria-labelledby="' + CSS.escape(heading.id) + '"]'))
        || heading.closest('[role="group"], section, fieldset')
        || heading.parentElement;
    if (!section) continue;
    const buttons = Array.from(section.querySelectorAll('[data-automation-id="add-button"], button'))
        .filter((b) => __visible(b) && !b.disabled);
    const add = buttons.find((b) => b.getAttribute('data-automation-id') === 'add-button')
        || buttons.find((b) => ['add', 'add another'].includes(__clean(b.innerText).toLowerCase()));
    if (add) return __mark(add);
}
return __mark(null);
"#;

/// Remove every click/upload mark.
pub static CLEAR_MARKS: &str = r#"
return __mark(null);
"#;

/// Whether any element matching `args.selector` is visible.
pub static ANY_VISIBLE: &str = r#"
return Array.from(document.querySelectorAll(args.selector)).some(__visible);
"#;

/// Workday validation indicators shown after a rejected Next click.
pub const ERROR_INDICATORS: &str = r#"[data-automation-id="errorMessage"], [data-automation-id="errorBanner"], [data-automation-id="inputAlert"], [aria-invalid="true"]"#;

/// Entries of the Workday progress bar.
pub static PROGRESS: &str = r#"
return Array.from(document.querySelectorAll('[data-automation-id^="progressBar"] li')).map((li) => {
    const labels = li.querySelectorAll('label');
    const caption = labels.length > 1 ? labels[1].innerText : (labels.length ? labels[0].innerText : li.innerText);
    return {
        name: __clean(caption),
        active: li.getAttribute('data-automation-id') === 'progressBarActiveStep'
            || li.getAttribute('aria-current') === 'step',
    };
});
"#;
