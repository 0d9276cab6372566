fn main() {
    slint_build::compile("ui/app.slint").expect("编译 Slint UI 失败");
}
