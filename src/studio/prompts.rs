//! 面向最终用户的提示文案（阿拉伯语界面）

/// 生成的数据为空时的提示
pub const ENTER_DATA: &str = "من فضلك أدخل البيانات";

/// 删除前的确认提示
pub const CONFIRM_DELETE: &str = "حذف هذا الكود؟";

/// 账号或密码错误
pub const INVALID_CREDENTIALS: &str = "البريد أو كلمة المرور غير صحيحة";

/// 邮箱未确认，已自动重发确认邮件
pub const EMAIL_NOT_CONFIRMED: &str =
    "البريد الإلكتروني غير مؤكد. أعدنا إرسال رابط التأكيد إلى بريدك";

/// 注册成功
pub const ACCOUNT_CREATED: &str = "تم إنشاء الحساب! يمكنك تسجيل الدخول الآن";

/// 本地模式横幅
pub const LOCAL_MODE_BANNER: &str = "أنت تستخدم الوضع المحلي - البيانات محفوظة على هذا الجهاز فقط";

/// 云端保存失败
pub fn save_failed(reason: &str) -> String {
    format!("تعذر حفظ البيانات: {}", reason)
}

/// 云端加载失败
pub fn load_failed(reason: &str) -> String {
    format!("تعذر تحميل الرموز: {}", reason)
}

/// 未填写名称时的默认名称
pub fn default_record_name(sequence: usize) -> String {
    format!("QR {}", sequence)
}
